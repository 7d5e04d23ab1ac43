use serde::{Deserialize, Serialize};

/// Progress of one OCR run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrState {
    #[default]
    Idle,
    Uploading,
    Extracting,
    Done,
    Failed,
}

/// Handle to a file held by the remote file store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Resource name used for deletion, e.g. `files/abc123`.
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrOutput {
    pub text: String,
    pub file_name: String,
}

impl OcrOutput {
    pub fn new(text: impl Into<String>, source_stem: &str) -> Self {
        Self {
            text: text.into(),
            file_name: download_file_name(source_stem),
        }
    }

    /// First `max_chars` characters followed by `...`.
    pub fn preview(&self, max_chars: usize) -> String {
        let head: String = self.text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}

pub fn download_file_name(source_stem: &str) -> String {
    format!("ocr_output_{source_stem}.txt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_file_name() {
        let output = OcrOutput::new("text", "scan_01");
        assert_eq!(output.file_name, "ocr_output_scan_01.txt");
    }

    #[test]
    fn test_preview() {
        let output = OcrOutput::new("abcdef", "x");
        assert_eq!(output.preview(3), "abc...");
    }
}
