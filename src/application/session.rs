//! Per-session state and the process-wide session registry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::application::services::DocumentIndex;
use crate::domain::{ChatRole, ContentHash, DocumentChunk, DocumentPage, OcrOutput, Transcript};

/// The processed document together with everything derived from it.
///
/// Transcript, sources and summary live here so they cannot outlive the
/// index they were produced against.
#[derive(Debug, Clone)]
pub struct CachedDocument {
    pub hash: ContentHash,
    pub file_name: String,
    pub pages: Vec<DocumentPage>,
    pub index: DocumentIndex,
    pub transcript: Transcript,
    pub last_sources: Vec<DocumentChunk>,
    pub summary: Option<String>,
}

impl CachedDocument {
    pub fn new(
        hash: ContentHash,
        file_name: impl Into<String>,
        pages: Vec<DocumentPage>,
        index: DocumentIndex,
    ) -> Self {
        Self {
            hash,
            file_name: file_name.into(),
            pages,
            index,
            transcript: Transcript::new(),
            last_sources: Vec::new(),
            summary: None,
        }
    }
}

#[derive(Debug)]
pub struct SessionContext {
    document: Option<CachedDocument>,
    ocr: Option<OcrOutput>,
    created_at: DateTime<Utc>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            document: None,
            ocr: None,
            created_at: Utc::now(),
        }
    }

    pub fn document(&self) -> Option<&CachedDocument> {
        self.document.as_ref()
    }

    pub fn document_mut(&mut self) -> Option<&mut CachedDocument> {
        self.document.as_mut()
    }

    /// Replaces the cached document, dropping the previous index and transcript.
    pub fn activate(&mut self, document: CachedDocument) {
        self.document = Some(document);
    }

    pub fn evict(&mut self) -> Option<CachedDocument> {
        self.document.take()
    }

    /// Empties the transcript and the last-used sources. Returns false when no
    /// document is loaded.
    pub fn clear_chat(&mut self) -> bool {
        match self.document.as_mut() {
            Some(doc) => {
                doc.transcript.clear();
                doc.last_sources.clear();
                true
            }
            None => false,
        }
    }

    pub fn ocr(&self) -> Option<&OcrOutput> {
        self.ocr.as_ref()
    }

    pub fn set_ocr(&mut self, output: Option<OcrOutput>) {
        self.ocr = output;
    }

    pub fn snapshot(&self, excerpt_chars: usize, preview_chars: usize) -> SessionSnapshot {
        SessionSnapshot {
            created_at: self.created_at,
            document: self.document.as_ref().map(|doc| DocumentView {
                file_name: doc.file_name.clone(),
                content_hash: doc.hash.clone(),
                pages: doc.pages.len(),
                chunks: doc.index.chunk_count(),
                transcript: doc
                    .transcript
                    .turns
                    .iter()
                    .map(|turn| TurnView {
                        role: turn.role,
                        content: turn.content.clone(),
                        sources: turn
                            .sources
                            .as_ref()
                            .map(|s| SourceView::list(s, excerpt_chars)),
                    })
                    .collect(),
                summary: doc.summary.clone(),
            }),
            ocr: self.ocr.as_ref().map(|out| OcrView {
                file_name: out.file_name.clone(),
                preview: out.preview(preview_chars),
                chars: out.text.chars().count(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub created_at: DateTime<Utc>,
    pub document: Option<DocumentView>,
    pub ocr: Option<OcrView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    pub file_name: String,
    pub content_hash: ContentHash,
    pub pages: usize,
    pub chunks: usize,
    pub transcript: Vec<TurnView>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnView {
    pub role: ChatRole,
    pub content: String,
    pub sources: Option<Vec<SourceView>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OcrView {
    pub file_name: String,
    pub preview: String,
    pub chars: usize,
}

/// A retrieved chunk as shown next to an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceView {
    pub source: String,
    pub page: String,
    pub excerpt: String,
}

impl SourceView {
    pub fn from_chunk(chunk: &DocumentChunk, excerpt_chars: usize) -> Self {
        Self {
            source: chunk.metadata.source.clone(),
            page: chunk.metadata.page_label(),
            excerpt: chunk.excerpt(excerpt_chars),
        }
    }

    pub fn list(chunks: &[DocumentChunk], excerpt_chars: usize) -> Vec<Self> {
        chunks
            .iter()
            .map(|c| Self::from_chunk(c, excerpt_chars))
            .collect()
    }
}

pub type SharedSession = Arc<Mutex<SessionContext>>;

struct RegistryEntry {
    session: SharedSession,
    last_active: Instant,
}

impl RegistryEntry {
    fn new() -> Self {
        Self {
            session: Arc::new(Mutex::new(SessionContext::new())),
            last_active: Instant::now(),
        }
    }

    fn is_idle(&self, ttl: Duration) -> bool {
        self.last_active.elapsed() >= ttl
    }
}

/// Live sessions by id. Each session is locked for the whole of an
/// interaction, so requests within one session are serialized.
///
/// A session untouched for longer than the idle TTL is treated as gone and
/// dropped on the next lookup or sweep.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, RegistryEntry>>>,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub async fn create(&self) -> Uuid {
        self.evict_idle().await;

        let id = Uuid::new_v4();
        self.sessions.write().await.insert(id, RegistryEntry::new());
        tracing::debug!(session_id = %id, "session created");
        id
    }

    /// Returns the session and marks it active.
    pub async fn get(&self, id: &Uuid) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        if entry.is_idle(self.idle_ttl) {
            sessions.remove(id);
            tracing::info!(session_id = %id, "session expired");
            return None;
        }
        entry.last_active = Instant::now();
        Some(entry.session.clone())
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session idle for longer than the TTL and returns how
    /// many were dropped.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_idle(self.idle_ttl));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "idle sessions evicted");
        }
        evicted
    }
}
