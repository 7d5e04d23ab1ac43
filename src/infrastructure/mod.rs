pub mod config;
pub mod embedding;
pub mod gemini_files;
pub mod llm;
pub mod loader;
pub mod vector_store;

pub use config::{AppConfig, Config, ConfigError, GeminiCredentials, PromptsConfig};
pub use embedding::GeminiEmbedding;
pub use gemini_files::GeminiFileClient;
pub use llm::GeminiLlm;
pub use loader::DocumentLoader;
pub use vector_store::{InMemoryVectorStore, InMemoryVectorStoreFactory};
