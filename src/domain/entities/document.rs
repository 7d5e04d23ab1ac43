use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

/// Lowercase hex MD5 digest of an upload's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Md5::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of(&self.bytes)
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == MIME_PDF
    }

    /// Extension of the original name, used as the temp file suffix.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name).extension().and_then(|e| e.to_str())
    }

    /// File name without its final extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub source: String,
    pub page: Option<usize>,
}

impl PageMetadata {
    pub fn page_label(&self) -> String {
        self.page
            .map(|p| p.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// One loaded page (PDF) or the whole file (text).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPage {
    pub page_content: String,
    pub metadata: PageMetadata,
}

impl DocumentPage {
    pub fn new(page_content: impl Into<String>, metadata: PageMetadata) -> Self {
        Self {
            page_content: page_content.into(),
            metadata,
        }
    }
}

/// Concatenates page text with `\n` and keeps at most `max_chars` characters.
pub fn joined_text(pages: &[DocumentPage], max_chars: usize) -> String {
    let joined = pages
        .iter()
        .map(|p| p.page_content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    match joined.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => joined[..byte_idx].to_string(),
        None => joined,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub content: String,
    pub chunk_index: usize,
    pub metadata: PageMetadata,
}

impl DocumentChunk {
    pub fn new(content: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            chunk_index,
            metadata: PageMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: PageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// First `max_chars` characters, for source previews.
    pub fn excerpt(&self, max_chars: usize) -> String {
        self.content.chars().take(max_chars).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_stable() {
        let a = ContentHash::of(b"Paris is the capital of France.");
        let b = ContentHash::of(b"Paris is the capital of France.");
        let c = ContentHash::of(b"Berlin is the capital of Germany.");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_content_hash_known_digest() {
        assert_eq!(
            ContentHash::of(b"").as_str(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn test_uploaded_file_stem_and_extension() {
        let file = UploadedFile::new("lecture.notes.pdf", MIME_PDF, vec![]);
        assert_eq!(file.stem(), "lecture.notes");
        assert_eq!(file.extension(), Some("pdf"));
        assert!(file.is_pdf());
    }

    #[test]
    fn test_joined_text_truncates_by_chars() {
        let pages = vec![
            DocumentPage::new("héllo", PageMetadata::default()),
            DocumentPage::new("wörld", PageMetadata::default()),
        ];

        assert_eq!(joined_text(&pages, 100), "héllo\nwörld");
        assert_eq!(joined_text(&pages, 7), "héllo\nw");
    }

    #[test]
    fn test_page_label() {
        let meta = PageMetadata {
            source: "a.pdf".into(),
            page: Some(2),
        };
        assert_eq!(meta.page_label(), "2");
        assert_eq!(PageMetadata::default().page_label(), "N/A");
    }
}
