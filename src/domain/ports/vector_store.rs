use crate::domain::{errors::DomainError, DocumentChunk, Embedding, SearchResult};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Inserts all pairs under one write. An entry whose chunk id is already
    /// stored replaces it.
    async fn insert_all(&self, entries: Vec<(DocumentChunk, Embedding)>)
        -> Result<(), DomainError>;
    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
}

/// Creates a fresh, empty store for each indexed document.
pub trait VectorStoreFactory: Send + Sync {
    fn create(&self) -> Arc<dyn VectorStore>;
}
