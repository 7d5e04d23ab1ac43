use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    ports::{EmbeddingService, VectorStore, VectorStoreFactory},
    DocumentChunk, DomainError, SearchResult,
};

/// Similarity index over one document's chunks.
#[derive(Clone)]
pub struct DocumentIndex {
    store: Arc<dyn VectorStore>,
    chunk_count: usize,
}

impl DocumentIndex {
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("chunk_count", &self.chunk_count)
            .finish()
    }
}

pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    stores: Arc<dyn VectorStoreFactory>,
    default_top_k: usize,
}

impl RagService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        stores: Arc<dyn VectorStoreFactory>,
        default_top_k: usize,
    ) -> Self {
        Self {
            embedding,
            stores,
            default_top_k,
        }
    }

    /// Embeds all chunks in one batch and loads them into a fresh store.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn build_index(&self, chunks: &[DocumentChunk]) -> Result<DocumentIndex, DomainError> {
        if chunks.is_empty() {
            return Err(DomainError::validation("No valid text chunks to index"));
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedding.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(DomainError::internal(format!(
                "embedding count mismatch: {} chunks, {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let store = self.stores.create();
        store
            .insert_all(chunks.iter().cloned().zip(embeddings).collect())
            .await?;

        tracing::info!(chunks = chunks.len(), "index built");
        Ok(DocumentIndex {
            store,
            chunk_count: chunks.len(),
        })
    }

    #[instrument(skip(self, index))]
    pub async fn retrieve(
        &self,
        index: &DocumentIndex,
        query: &str,
    ) -> Result<Vec<SearchResult>, DomainError> {
        self.retrieve_top_k(index, query, self.default_top_k).await
    }

    #[instrument(skip(self, index))]
    pub async fn retrieve_top_k(
        &self,
        index: &DocumentIndex,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let embedding = self.embedding.embed(query).await?;
        index.store.search(&embedding, top_k).await
    }
}
