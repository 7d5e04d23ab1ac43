use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::domain::{
    ports::{VectorStore, VectorStoreFactory},
    DocumentChunk, DomainError, Embedding, SearchResult,
};

#[derive(Default)]
struct Entries {
    rows: Vec<(DocumentChunk, Embedding)>,
    positions: HashMap<Uuid, usize>,
}

/// Brute-force cosine-similarity index held in process memory.
pub struct InMemoryVectorStore {
    entries: RwLock<Entries>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn insert_all(
        &self,
        batch: Vec<(DocumentChunk, Embedding)>,
    ) -> Result<(), DomainError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        entries.rows.reserve(batch.len());
        for (chunk, embedding) in batch {
            match entries.positions.get(&chunk.id).copied() {
                Some(pos) => entries.rows[pos] = (chunk, embedding),
                None => {
                    let pos = entries.rows.len();
                    entries.positions.insert(chunk.id, pos);
                    entries.rows.push((chunk, embedding));
                }
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let mut results: Vec<SearchResult> = entries
            .rows
            .iter()
            .map(|(chunk, embedding)| SearchResult {
                chunk: chunk.clone(),
                score: query.cosine_similarity(embedding),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(top_k);
        Ok(results)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        self.entries
            .read()
            .map(|entries| entries.rows.len())
            .map_err(|e| DomainError::internal(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryVectorStoreFactory;

impl VectorStoreFactory for InMemoryVectorStoreFactory {
    fn create(&self) -> Arc<dyn VectorStore> {
        Arc::new(InMemoryVectorStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_search() {
        let store = InMemoryVectorStore::new();
        let chunk = DocumentChunk::new("test content", 0);

        store
            .insert_all(vec![(chunk, Embedding::new(vec![1.0, 0.0, 0.0]))])
            .await
            .unwrap();

        let results = store
            .search(&Embedding::new(vec![1.0, 0.0, 0.0]), 1)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_search_ranks_and_truncates() {
        let store = InMemoryVectorStore::new();
        let near = DocumentChunk::new("near", 0);
        let far = DocumentChunk::new("far", 1);
        let mid = DocumentChunk::new("mid", 2);

        store
            .insert_all(vec![
                (far, Embedding::new(vec![0.0, 1.0])),
                (near, Embedding::new(vec![1.0, 0.0])),
                (mid, Embedding::new(vec![1.0, 1.0])),
            ])
            .await
            .unwrap();

        let results = store
            .search(&Embedding::new(vec![1.0, 0.0]), 2)
            .await
            .unwrap();

        let contents: Vec<_> = results.iter().map(|r| r.chunk.content.as_str()).collect();
        assert_eq!(contents, vec!["near", "mid"]);
    }

    #[tokio::test]
    async fn test_insert_replaces_same_chunk() {
        let store = InMemoryVectorStore::new();
        let chunk = DocumentChunk::new("test", 0);
        let other = DocumentChunk::new("other", 1);

        store
            .insert_all(vec![
                (chunk.clone(), Embedding::new(vec![1.0, 0.0])),
                (other, Embedding::new(vec![0.0, 1.0])),
            ])
            .await
            .unwrap();
        store
            .insert_all(vec![(chunk, Embedding::new(vec![0.0, 1.0]))])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let results = store
            .search(&Embedding::new(vec![1.0, 0.0]), 2)
            .await
            .unwrap();
        assert!(results.iter().all(|r| r.score.abs() < 1e-6));
    }

    #[tokio::test]
    async fn test_bulk_insert_keeps_every_chunk() {
        let store = InMemoryVectorStore::new();
        let batch: Vec<_> = (0..2000)
            .map(|i| (DocumentChunk::new(format!("chunk {i}"), i), Embedding::new(vec![1.0])))
            .collect();

        store.insert_all(batch).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2000);
    }

    #[tokio::test]
    async fn test_factory_creates_independent_stores() {
        let factory = InMemoryVectorStoreFactory;
        let first = factory.create();
        let second = factory.create();

        first
            .insert_all(vec![(DocumentChunk::new("a", 0), Embedding::new(vec![1.0]))])
            .await
            .unwrap();

        assert_eq!(first.count().await.unwrap(), 1);
        assert_eq!(second.count().await.unwrap(), 0);
    }
}
