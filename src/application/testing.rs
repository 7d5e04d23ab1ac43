//! Test doubles for the domain ports.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::{
    ports::{EmbeddingService, FileGenerationService, LlmService},
    DomainError, Embedding, RemoteFile,
};

const DIMENSIONS: usize = 4096;

/// Bag-of-words embedding: each lowercase word bumps one hashed dimension.
pub struct KeywordEmbedding {
    fail: bool,
    batch_calls: AtomicUsize,
    query_calls: AtomicUsize,
}

impl KeywordEmbedding {
    pub fn new() -> Self {
        Self {
            fail: false,
            batch_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    fn vectorize(text: &str) -> Embedding {
        let mut vec = vec![0.0f32; DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vec[(hasher.finish() as usize) % DIMENSIONS] += 1.0;
        }
        Embedding::new(vec)
    }
}

#[async_trait]
impl EmbeddingService for KeywordEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DomainError::external("embedding API unavailable"));
        }
        Ok(Self::vectorize(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DomainError::external("embedding API unavailable"));
        }
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }
}

#[derive(Debug, Clone)]
enum LlmBehavior {
    Reply(String),
    Fail(String),
    Block,
}

/// LLM double that records every prompt and answers from a script.
pub struct ScriptedLlm {
    behavior: LlmBehavior,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::with(LlmBehavior::Reply(reply.into()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with(LlmBehavior::Fail(message.into()))
    }

    pub fn blocking() -> Self {
        Self::with(LlmBehavior::Block)
    }

    fn with(behavior: LlmBehavior) -> Self {
        Self {
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.behavior {
            LlmBehavior::Reply(reply) => Ok(reply.clone()),
            LlmBehavior::Fail(message) => Err(DomainError::external(message.clone())),
            LlmBehavior::Block => Err(DomainError::safety_blocked("response was blocked")),
        }
    }
}

/// In-memory stand-in for the remote file store and multimodal model.
#[derive(Default)]
pub struct FakeFileStore {
    fail_upload: bool,
    fail_generate: bool,
    fail_delete: bool,
    extracted_text: String,
    uploads: AtomicUsize,
    deletes: AtomicUsize,
    timeouts: Mutex<Vec<Duration>>,
}

impl FakeFileStore {
    pub fn extracting(text: impl Into<String>) -> Self {
        Self {
            extracted_text: text.into(),
            ..Self::default()
        }
    }

    pub fn failing_upload() -> Self {
        Self {
            fail_upload: true,
            ..Self::default()
        }
    }

    pub fn failing_generate() -> Self {
        Self {
            fail_generate: true,
            ..Self::default()
        }
    }

    /// Extracts `text` but rejects the cleanup delete.
    pub fn failing_delete(text: impl Into<String>) -> Self {
        Self {
            fail_delete: true,
            ..Self::extracting(text)
        }
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileGenerationService for FakeFileStore {
    async fn upload_file(
        &self,
        _bytes: &[u8],
        display_name: &str,
        mime_type: &str,
    ) -> Result<RemoteFile, DomainError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_upload {
            return Err(DomainError::external("upload rejected"));
        }
        Ok(RemoteFile {
            name: "files/fake-1".to_string(),
            uri: "https://files.example/fake-1".to_string(),
            mime_type: mime_type.to_string(),
            display_name: display_name.to_string(),
        })
    }

    async fn generate_with_file(
        &self,
        _instructions: &[String],
        _file: &RemoteFile,
        timeout: Duration,
    ) -> Result<String, DomainError> {
        self.timeouts.lock().unwrap().push(timeout);
        if self.fail_generate {
            return Err(DomainError::external("model overloaded"));
        }
        Ok(self.extracted_text.clone())
    }

    async fn delete_file(&self, _file: &RemoteFile) -> Result<(), DomainError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete {
            return Err(DomainError::external("delete failed"));
        }
        Ok(())
    }
}
