use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::domain::{
    ports::FileGenerationService, DomainError, OcrState, RemoteFile, UploadedFile,
};

/// Outcome of one OCR run, including every state it passed through.
#[derive(Debug, Clone)]
pub struct OcrRun {
    pub state: OcrState,
    pub states: Vec<OcrState>,
    pub text: Option<String>,
    pub error: Option<String>,
}

impl OcrRun {
    fn start() -> Self {
        Self {
            state: OcrState::Idle,
            states: vec![OcrState::Idle],
            text: None,
            error: None,
        }
    }

    fn advance(&mut self, next: OcrState) {
        self.state = next;
        self.states.push(next);
    }

    fn finish(mut self, text: String) -> Self {
        self.advance(OcrState::Done);
        self.text = Some(text);
        self
    }

    fn fail(mut self, error: impl Into<String>) -> Self {
        self.advance(OcrState::Failed);
        self.error = Some(error.into());
        self
    }
}

/// Text extraction from scanned PDFs through a multimodal model.
pub struct OcrService {
    files: Arc<dyn FileGenerationService>,
    instructions: Vec<String>,
    timeout: Duration,
}

impl OcrService {
    pub fn new(
        files: Arc<dyn FileGenerationService>,
        instructions: Vec<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            files,
            instructions,
            timeout,
        }
    }

    /// Uploads, extracts and deletes. Never returns an error: failures are
    /// reported through [`OcrRun::error`] with no text.
    #[instrument(skip(self, file), fields(name = %file.name, bytes = file.bytes.len()))]
    pub async fn run(&self, file: &UploadedFile) -> OcrRun {
        let mut run = OcrRun::start();

        run.advance(OcrState::Uploading);
        let remote = match self
            .files
            .upload_file(&file.bytes, &file.name, &file.mime_type)
            .await
        {
            Ok(remote) => remote,
            Err(e) => {
                tracing::error!(error = %e, "OCR upload failed");
                return run.fail(format!("OCR Error: {e}"));
            }
        };

        run.advance(OcrState::Extracting);
        let extracted = self
            .files
            .generate_with_file(&self.instructions, &remote, self.timeout)
            .await;
        self.discard(&remote).await;

        match extracted {
            Ok(text) if !text.trim().is_empty() => {
                tracing::info!(chars = text.chars().count(), "OCR complete");
                run.finish(text)
            }
            Ok(_) => {
                tracing::warn!("OCR returned no text");
                run.fail("OCR failed or no text was extracted.")
            }
            Err(e) => {
                tracing::error!(error = %e, "OCR extraction failed");
                run.fail(describe(&e))
            }
        }
    }

    async fn discard(&self, remote: &RemoteFile) {
        match self.files.delete_file(remote).await {
            Ok(()) => tracing::debug!(file = %remote.name, "remote file deleted"),
            Err(e) => tracing::warn!(
                file = %remote.name,
                error = %e,
                "could not delete temporary file from the file store"
            ),
        }
    }
}

fn describe(e: &DomainError) -> String {
    match e {
        DomainError::Timeout(_) => "OCR Error: extraction timed out".to_string(),
        other => format!("OCR Error: {other}"),
    }
}
