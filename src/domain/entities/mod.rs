mod conversation;
mod document;
mod embedding;
mod ocr;
mod study;

pub use conversation::{ChatRole, ChatTurn, Transcript};
pub use document::{
    joined_text, ContentHash, DocumentChunk, DocumentPage, PageMetadata, SearchResult,
    UploadedFile, MIME_PDF, MIME_TEXT,
};
pub use embedding::Embedding;
pub use ocr::{download_file_name, OcrOutput, OcrState, RemoteFile};
pub use study::{parse_delimited_pairs, StudyPair, Subject, SummaryLength, PAIR_DELIMITER};
