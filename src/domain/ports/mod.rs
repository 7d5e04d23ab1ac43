mod embedding;
mod file_generation;
mod llm;
mod vector_store;

pub use embedding::EmbeddingService;
pub use file_generation::FileGenerationService;
pub use llm::LlmService;
pub use vector_store::{VectorStore, VectorStoreFactory};
