use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("No extractable text: {0}")]
    EmptyExtraction(String),

    #[error("Response blocked by safety settings: {0}")]
    SafetyBlocked(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DomainError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn external(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    pub fn empty_extraction(msg: impl Into<String>) -> Self {
        Self::EmptyExtraction(msg.into())
    }

    pub fn safety_blocked(msg: impl Into<String>) -> Self {
        Self::SafetyBlocked(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Classifies a provider error message, recognising safety blocks.
    pub fn from_provider(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let lower = msg.to_lowercase();
        if lower.contains("response was blocked")
            || lower.contains("safety settings")
            || lower.contains("blockreason")
        {
            Self::SafetyBlocked(msg)
        } else {
            Self::ExternalService(msg)
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
