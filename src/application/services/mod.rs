mod document;
mod ocr;
mod rag;
mod study;

pub use document::{DocumentService, PreparedDocument};
pub use ocr::{OcrRun, OcrService};
pub use rag::{DocumentIndex, RagService};
pub use study::StudyService;
