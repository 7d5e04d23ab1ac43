use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::path::Path as FsPath;
use uuid::Uuid;

use crate::api::{error::ApiError, routes::dispatch, state::AppState};
use crate::application::Interaction;
use crate::domain::{UploadedFile, MIME_PDF, MIME_TEXT};

const FILE_FIELD: &str = "file";

/// Reads the `file` field of a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ApiError::BadRequest("uploaded file has no name".to_string()))?;
        let declared = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        let mime_type = resolve_mime(&name, declared.as_deref()).ok_or_else(|| {
            ApiError::UnsupportedMediaType(format!(
                "'{name}' is not a PDF or plain-text file"
            ))
        })?;
        return Ok(UploadedFile::new(name, mime_type, bytes.to_vec()));
    }
    Err(ApiError::BadRequest(format!("missing multipart field '{FILE_FIELD}'")))
}

/// Declared content type first, then the file extension.
fn resolve_mime(name: &str, declared: Option<&str>) -> Option<&'static str> {
    let declared = declared
        .and_then(|d| d.split(';').next())
        .map(|d| d.trim().to_ascii_lowercase());
    match declared.as_deref() {
        Some(MIME_PDF) => return Some(MIME_PDF),
        Some(MIME_TEXT) => return Some(MIME_TEXT),
        _ => {}
    }

    let extension = FsPath::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => Some(MIME_PDF),
        Some("txt") => Some(MIME_TEXT),
        _ => None,
    }
}

pub async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    state.session(id).await?;
    let file = read_upload(multipart).await?;
    tracing::info!(session_id = %id, name = %file.name, bytes = file.bytes.len(), "study file received");
    dispatch(&state, id, Interaction::UploadStudyFile(file)).await
}

pub async fn run_ocr(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    state.session(id).await?;
    let file = read_upload(multipart).await?;
    if !file.is_pdf() {
        return Err(ApiError::UnsupportedMediaType(
            "OCR accepts PDF files only".to_string(),
        ));
    }
    tracing::info!(session_id = %id, name = %file.name, bytes = file.bytes.len(), "OCR file received");
    dispatch(&state, id, Interaction::RunOcr(file)).await
}

pub async fn download_ocr(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let session = state.session(id).await?;
    let ctx = session.lock().await;
    let output = ctx
        .ocr()
        .ok_or_else(|| ApiError::NotFound("no OCR output in this session".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", output.file_name),
            ),
        ],
        output.text.clone(),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_mime() {
        assert_eq!(resolve_mime("a.bin", Some("application/pdf")), Some(MIME_PDF));
        assert_eq!(
            resolve_mime("notes", Some("text/plain; charset=utf-8")),
            Some(MIME_TEXT)
        );
        assert_eq!(
            resolve_mime("Scan.PDF", Some("application/octet-stream")),
            Some(MIME_PDF)
        );
        assert_eq!(resolve_mime("notes.txt", None), Some(MIME_TEXT));
        assert_eq!(resolve_mime("image.png", Some("image/png")), None);
    }
}
