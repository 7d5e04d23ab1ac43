use crate::domain::{errors::DomainError, RemoteFile};
use async_trait::async_trait;
use std::time::Duration;

/// Remote file store plus multimodal generation over stored files.
#[async_trait]
pub trait FileGenerationService: Send + Sync {
    async fn upload_file(
        &self,
        bytes: &[u8],
        display_name: &str,
        mime_type: &str,
    ) -> Result<RemoteFile, DomainError>;

    async fn generate_with_file(
        &self,
        instructions: &[String],
        file: &RemoteFile,
        timeout: Duration,
    ) -> Result<String, DomainError>;

    async fn delete_file(&self, file: &RemoteFile) -> Result<(), DomainError>;
}
