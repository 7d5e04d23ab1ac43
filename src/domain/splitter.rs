//! Recursive character text splitter.
//!
//! Text is cut on the coarsest separator present (`"\n\n"`, then `"\n"`, then
//! `" "`, then between characters). Pieces are merged greedily into windows of
//! at most `chunk_size` characters; when a window is emitted, its tail of up to
//! `chunk_overlap` characters is carried into the next one. Separators stay
//! attached to the start of the piece that follows them, and every window is
//! trimmed. All lengths are counted in characters.

use std::collections::VecDeque;

use crate::domain::{DocumentChunk, DocumentPage, DomainError};

pub const DEFAULT_CHUNK_SIZE: usize = 1500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 300;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, DomainError> {
        if chunk_size == 0 {
            return Err(DomainError::validation("chunk_size must be positive"));
        }
        if chunk_overlap >= chunk_size {
            return Err(DomainError::validation(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Splits every page and drops chunks that are blank after trimming.
    /// Chunk indices run sequentially across all pages.
    pub fn split_documents(&self, pages: &[DocumentPage]) -> Vec<DocumentChunk> {
        pages
            .iter()
            .flat_map(|page| {
                self.split_text(&page.page_content)
                    .into_iter()
                    .map(move |text| (text, page.metadata.clone()))
            })
            .filter(|(text, _)| !text.trim().is_empty())
            .enumerate()
            .map(|(i, (text, metadata))| DocumentChunk::new(text, i).with_metadata(metadata))
            .collect()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s))
            .unwrap_or(separators.len() - 1);
        let separator = separators[position];
        let remaining = &separators[position + 1..];

        let mut out = Vec::new();
        let mut small: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                out.extend(self.merge(&small));
                small.clear();
            }

            if remaining.is_empty() {
                out.push(piece);
            } else {
                out.extend(self.split_with(&piece, remaining));
            }
        }

        if !small.is_empty() {
            out.extend(self.merge(&small));
        }

        out
    }

    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut windows = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                push_window(&mut windows, &current);

                while total > self.chunk_overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    match current.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        push_window(&mut windows, &current);
        windows
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

fn push_window(windows: &mut Vec<String>, current: &VecDeque<&str>) {
    let joined: String = current.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        windows.push(trimmed.to_string());
    }
}

fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(text[start..idx].to_string());
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(text[start..].to_string());
    }

    pieces.retain(|p| !p.is_empty());
    pieces
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PageMetadata;

    fn page(text: &str, page: Option<usize>) -> DocumentPage {
        DocumentPage::new(
            text,
            PageMetadata {
                source: "notes.txt".into(),
                page,
            },
        )
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(TextSplitter::new(100, 100).is_err());
        assert!(TextSplitter::new(0, 0).is_err());
        assert!(TextSplitter::new(100, 20).is_ok());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = TextSplitter::default();
        let chunks = splitter.split_documents(&[page("Paris is the capital of France.", None)]);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Paris is the capital of France.");
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].metadata.source, "notes.txt");
    }

    #[test]
    fn test_exactly_one_window_yields_one_chunk() {
        let splitter = TextSplitter::default();

        let solid = "a".repeat(DEFAULT_CHUNK_SIZE);
        assert_eq!(splitter.split_text(&solid), vec![solid.clone()]);

        let words = "word ".repeat(DEFAULT_CHUNK_SIZE / 5);
        let words = words.trim_end().to_string() + " ";
        assert_eq!(words.chars().count(), DEFAULT_CHUNK_SIZE);
        let chunks = splitter.split_text(&words);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], words.trim());
    }

    #[test]
    fn test_windows_respect_size_and_overlap() {
        let splitter = TextSplitter::new(50, 10).unwrap();
        let text = (0..40)
            .map(|i| format!("w{i:02}"))
            .collect::<Vec<_>>()
            .join(" ");

        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "chunk too long: {chunk}");
        }

        // Consecutive windows share their boundary words.
        for pair in chunks.windows(2) {
            let last_word = pair[0].split(' ').last().unwrap();
            assert!(pair[1].contains(last_word));
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let splitter = TextSplitter::new(30, 5).unwrap();
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let chunks = splitter.split_text(text);

        assert_eq!(
            chunks,
            vec!["First paragraph here.", "Second paragraph here."]
        );
    }

    #[test]
    fn test_deterministic() {
        let splitter = TextSplitter::new(40, 8).unwrap();
        let text = "lorem ipsum dolor sit amet ".repeat(20);
        assert_eq!(splitter.split_text(&text), splitter.split_text(&text));
    }

    #[test]
    fn test_multibyte_text_is_not_split_inside_chars() {
        let splitter = TextSplitter::new(10, 2).unwrap();
        let text = "é".repeat(25);
        let chunks = splitter.split_text(&text);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn test_blank_pages_are_dropped_and_indices_sequential() {
        let splitter = TextSplitter::default();
        let chunks = splitter.split_documents(&[
            page("Page one text.", Some(0)),
            page("   \n  ", Some(1)),
            page("Page three text.", Some(2)),
        ]);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[1].chunk_index, 1);
        assert_eq!(chunks[1].metadata.page, Some(2));
    }
}
