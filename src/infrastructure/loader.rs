//! Upload loading: bytes are spooled to a temporary file, then read back
//! through the PDF or plain-text loader.
//!
//! The temporary file is owned by a [`tempfile::NamedTempFile`] and removed
//! when it goes out of scope, on success and failure alike.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::instrument;

use crate::domain::{DocumentPage, DomainError, PageMetadata, UploadedFile};

#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    temp_dir: Option<PathBuf>,
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spools uploads into `dir` instead of the system temp directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Loads pages on the blocking pool.
    ///
    /// A PDF without any non-whitespace text fails with
    /// [`DomainError::EmptyExtraction`].
    #[instrument(skip(self, file), fields(name = %file.name, mime = %file.mime_type, bytes = file.bytes.len()))]
    pub async fn load(&self, file: &UploadedFile) -> Result<Vec<DocumentPage>, DomainError> {
        let loader = self.clone();
        let file = file.clone();
        tokio::task::spawn_blocking(move || loader.load_blocking(&file))
            .await
            .map_err(|e| DomainError::internal(format!("loader task failed: {e}")))?
    }

    pub fn load_blocking(&self, file: &UploadedFile) -> Result<Vec<DocumentPage>, DomainError> {
        let suffix = file.extension().map(|e| format!(".{e}")).unwrap_or_default();
        let mut builder = tempfile::Builder::new();
        builder.prefix("upload-").suffix(&suffix);

        let mut tmp = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        tmp.write_all(&file.bytes)?;
        tmp.flush()?;

        let pages = if file.is_pdf() {
            load_pdf(tmp.path(), &file.name)?
        } else {
            load_text(tmp.path(), &file.name)?
        };

        if file.is_pdf() && pages.iter().all(|p| p.page_content.trim().is_empty()) {
            return Err(DomainError::empty_extraction(format!(
                "'{}' contains no extractable text; it is likely a scanned PDF, run OCR first",
                file.name
            )));
        }

        tracing::debug!(pages = pages.len(), "document loaded");
        Ok(pages)
    }
}

fn load_pdf(path: &Path, source: &str) -> Result<Vec<DocumentPage>, DomainError> {
    let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| {
        DomainError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("PDF extraction failed: {e}"),
        ))
    })?;

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            DocumentPage::new(
                text,
                PageMetadata {
                    source: source.to_string(),
                    page: Some(i),
                },
            )
        })
        .collect())
}

fn load_text(path: &Path, source: &str) -> Result<Vec<DocumentPage>, DomainError> {
    let text = std::fs::read_to_string(path)?;
    Ok(vec![DocumentPage::new(
        text,
        PageMetadata {
            source: source.to_string(),
            page: None,
        },
    )])
}


#[cfg(test)]
mod tests {
    use super::fixtures::{blank_pdf, text_pdf};
    use super::*;
    use crate::domain::{MIME_PDF, MIME_TEXT};

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_load_text_file() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = DocumentLoader::new().with_temp_dir(tmp.path());
        let file = UploadedFile::new(
            "notes.txt",
            MIME_TEXT,
            b"Paris is the capital of France.".to_vec(),
        );

        let pages = loader.load(&file).await.unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_content, "Paris is the capital of France.");
        assert_eq!(pages[0].metadata.source, "notes.txt");
        assert_eq!(pages[0].metadata.page, None);
        assert!(dir_is_empty(tmp.path()));
    }

    #[tokio::test]
    async fn test_load_pdf_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = DocumentLoader::new().with_temp_dir(tmp.path());
        let file = UploadedFile::new("lecture.pdf", MIME_PDF, text_pdf("mitochondria energy"));

        let pages = loader.load(&file).await.unwrap();

        assert_eq!(pages.len(), 1);
        assert!(pages[0].page_content.contains("mitochondria"));
        assert_eq!(pages[0].metadata.page, Some(0));
        assert!(dir_is_empty(tmp.path()));
    }

    #[tokio::test]
    async fn test_blank_pdf_is_empty_extraction() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = DocumentLoader::new().with_temp_dir(tmp.path());
        let file = UploadedFile::new("scan.pdf", MIME_PDF, blank_pdf());

        let err = loader.load(&file).await.unwrap_err();

        assert!(matches!(err, DomainError::EmptyExtraction(_)));
        assert!(dir_is_empty(tmp.path()));
    }

    #[tokio::test]
    async fn test_invalid_utf8_text_fails_and_cleans_up() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = DocumentLoader::new().with_temp_dir(tmp.path());
        let file = UploadedFile::new("bad.txt", MIME_TEXT, vec![0xff, 0xfe, 0xfd]);

        let err = loader.load(&file).await.unwrap_err();

        assert!(matches!(err, DomainError::Io(_)));
        assert!(dir_is_empty(tmp.path()));
    }
}
