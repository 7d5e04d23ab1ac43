use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::{Embed, EmbedError, EmbeddingsBuilder, TextEmbedder};
use rig::providers::gemini;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

pub struct GeminiEmbedding {
    client: gemini::Client,
    model: String,
}

impl GeminiEmbedding {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: gemini::Client::from_env(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self::new(&config.model)
    }
}

/// Text tagged with its input position; the builder may return batches out of order.
struct PositionedText {
    position: usize,
    text: String,
}

impl Embed for PositionedText {
    fn embed(&self, embedder: &mut TextEmbedder) -> Result<(), EmbedError> {
        embedder.embed(self.text.clone());
        Ok(())
    }
}

#[async_trait]
impl EmbeddingService for GeminiEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::internal("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.client.embedding_model(&self.model);
        let documents = texts.iter().enumerate().map(|(position, text)| PositionedText {
            position,
            text: text.to_string(),
        });

        let mut embeddings = EmbeddingsBuilder::new(model)
            .documents(documents)
            .map_err(|e| DomainError::external(e.to_string()))?
            .build()
            .await
            .map_err(|e| DomainError::from_provider(e.to_string()))?;

        if embeddings.len() != texts.len() {
            return Err(DomainError::internal(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        embeddings.sort_by_key(|(doc, _)| doc.position);
        Ok(embeddings
            .into_iter()
            .map(|(_doc, emb)| Embedding::from(emb.first().vec))
            .collect())
    }
}
