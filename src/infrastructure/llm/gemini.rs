use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::gemini;

use crate::domain::{ports::LlmService, DomainError};
use crate::infrastructure::config::LlmConfig;

/// Single-shot Gemini text generation.
pub struct GeminiLlm {
    client: gemini::Client,
    model: String,
    temperature: f64,
}

impl GeminiLlm {
    /// Reads the provider key exported by [`GeminiCredentials::export_for_provider`].
    ///
    /// [`GeminiCredentials::export_for_provider`]: crate::infrastructure::GeminiCredentials::export_for_provider
    pub fn new(model: impl Into<String>, temperature: f64) -> Self {
        Self {
            client: gemini::Client::from_env(),
            model: model.into(),
            temperature,
        }
    }

    /// Model used by summaries, flashcards and practice questions.
    pub fn study(config: &LlmConfig) -> Self {
        Self::new(&config.model, config.study_temperature)
    }

    /// Model used by document chat.
    pub fn qna(config: &LlmConfig) -> Self {
        Self::new(&config.model, config.chat_temperature)
    }
}

#[async_trait]
impl LlmService for GeminiLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        let agent = self
            .client
            .agent(&self.model)
            .temperature(self.temperature)
            .build();

        agent
            .prompt(prompt)
            .await
            .map_err(|e| DomainError::from_provider(e.to_string()))
    }
}
