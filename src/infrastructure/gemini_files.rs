//! Gemini File API client: resumable upload, generation over an uploaded
//! file, and deletion.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::instrument;

use crate::domain::{ports::FileGenerationService, DomainError, RemoteFile};
use crate::infrastructure::config::OcrConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

pub struct GeminiFileClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiFileClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn from_config(api_key: impl Into<String>, config: &OcrConfig) -> Self {
        Self::new(api_key, &config.model, &config.api_base)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileResource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    uri: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Concatenated text of the first candidate, or a safety-block error.
fn response_text(response: GenerateContentResponse) -> Result<String, DomainError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(DomainError::safety_blocked(format!(
            "prompt blocked: {reason}"
        )));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::external("response contained no candidates"))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() && candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(DomainError::safety_blocked("response was blocked (SAFETY)"));
    }

    Ok(text)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DomainError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DomainError::from_provider(format!("{status}: {body}")))
}

fn transport_error(e: reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::timeout(e.to_string())
    } else {
        DomainError::external(e.to_string())
    }
}

#[async_trait]
impl FileGenerationService for GeminiFileClient {
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    async fn upload_file(
        &self,
        bytes: &[u8],
        display_name: &str,
        mime_type: &str,
    ) -> Result<RemoteFile, DomainError> {
        let start = self
            .http
            .post(format!("{}/upload/v1beta/files", self.api_base))
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await
            .map_err(transport_error)?;
        let start = check_status(start).await?;

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| DomainError::external("upload session returned no upload URL"))?
            .to_string();

        let finished = self
            .http
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(transport_error)?;
        let uploaded: UploadResponse = check_status(finished)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        tracing::debug!(file = %uploaded.file.name, "file uploaded");
        Ok(RemoteFile {
            name: uploaded.file.name,
            uri: uploaded.file.uri,
            mime_type: uploaded.file.mime_type.unwrap_or_else(|| mime_type.to_string()),
            display_name: uploaded
                .file
                .display_name
                .unwrap_or_else(|| display_name.to_string()),
        })
    }

    #[instrument(skip(self, instructions), fields(file = %file.name))]
    async fn generate_with_file(
        &self,
        instructions: &[String],
        file: &RemoteFile,
        timeout: Duration,
    ) -> Result<String, DomainError> {
        let mut parts: Vec<serde_json::Value> = instructions
            .iter()
            .map(|text| json!({ "text": text }))
            .collect();
        parts.push(json!({
            "file_data": { "mime_type": file.mime_type, "file_uri": file.uri }
        }));

        let response = self
            .http
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.api_base, self.model
            ))
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(timeout)
            .json(&json!({ "contents": [{ "role": "user", "parts": parts }] }))
            .send()
            .await
            .map_err(transport_error)?;

        let body: GenerateContentResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        response_text(body)
    }

    #[instrument(skip(self), fields(file = %file.name))]
    async fn delete_file(&self, file: &RemoteFile) -> Result<(), DomainError> {
        let response = self
            .http
            .delete(format!("{}/v1beta/{}", self.api_base, file.name))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DomainError::not_found(file.name.clone()));
        }
        check_status(response).await.map(|_| ())
    }
}
