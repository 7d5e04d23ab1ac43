use tracing::instrument;

use crate::domain::{
    DocumentChunk, DocumentPage, DomainError, TextSplitter, UploadedFile, MIME_PDF, MIME_TEXT,
};
use crate::infrastructure::DocumentLoader;

/// Pages and retrieval chunks of one upload.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub pages: Vec<DocumentPage>,
    pub chunks: Vec<DocumentChunk>,
}

pub struct DocumentService {
    loader: DocumentLoader,
    splitter: TextSplitter,
}

impl DocumentService {
    pub fn new(loader: DocumentLoader, splitter: TextSplitter) -> Self {
        Self { loader, splitter }
    }

    /// Loads and splits an upload. Fails when nothing indexable remains.
    #[instrument(skip(self, file), fields(name = %file.name))]
    pub async fn prepare(&self, file: &UploadedFile) -> Result<PreparedDocument, DomainError> {
        if file.mime_type != MIME_PDF && file.mime_type != MIME_TEXT {
            return Err(DomainError::validation(format!(
                "unsupported file type '{}': upload a PDF or plain-text file",
                file.mime_type
            )));
        }

        let pages = self.loader.load(file).await?;
        let chunks = self.splitter.split_documents(&pages);
        if chunks.is_empty() {
            return Err(DomainError::validation("No valid text chunks after splitting"));
        }

        tracing::info!(pages = pages.len(), chunks = chunks.len(), "document prepared");
        Ok(PreparedDocument { pages, chunks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> DocumentService {
        DocumentService::new(DocumentLoader::new(), TextSplitter::default())
    }

    #[tokio::test]
    async fn test_prepare_text_file() {
        let file = UploadedFile::new(
            "notes.txt",
            MIME_TEXT,
            b"Paris is the capital of France.".to_vec(),
        );

        let prepared = service().prepare(&file).await.unwrap();

        assert_eq!(prepared.pages.len(), 1);
        assert_eq!(prepared.chunks.len(), 1);
        assert_eq!(prepared.chunks[0].content, "Paris is the capital of France.");
    }

    #[tokio::test]
    async fn test_prepare_whitespace_text_has_no_chunks() {
        let file = UploadedFile::new("blank.txt", MIME_TEXT, b"  \n\n \t ".to_vec());
        let err = service().prepare(&file).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_prepare_rejects_other_types() {
        let file = UploadedFile::new("image.png", "image/png", vec![0x89, 0x50]);
        let err = service().prepare(&file).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
