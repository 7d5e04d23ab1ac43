use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::SummaryLength;

pub const API_KEY_NAME: &str = "GOOGLE_API_KEY_GEMINI";
const PROVIDER_KEY_NAME: &str = "GEMINI_API_KEY";

const DEFAULT_SETTINGS_PATH: &str = "config/settings.yaml";
const DEFAULT_SECRETS_PATH: &str = "config/secrets.yaml";
const BUNDLED_PROMPTS: &str = include_str!("../../config/prompts.yaml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{0} not found in secrets file or environment")]
    MissingCredential(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings plus prompt templates.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

impl AppConfig {
    /// Default settings with the bundled prompts.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Ok(Self {
            config: Config::default(),
            prompts: PromptsConfig::bundled()?,
        })
    }

    /// Loads settings from `APP_CONFIG` (default `config/settings.yaml`, optional)
    /// and prompts from `PROMPTS_CONFIG` (default: bundled templates).
    pub fn load() -> Result<Self, ConfigError> {
        let settings_path = std::env::var("APP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH));

        let mut config = if settings_path.exists() {
            Config::from_yaml(&read_file(&settings_path)?)?
        } else {
            tracing::info!(path = %settings_path.display(), "settings file not found, using defaults");
            Config::default()
        };
        config.apply_env_overrides()?;

        let prompts = match std::env::var("PROMPTS_CONFIG") {
            Ok(path) => PromptsConfig::from_yaml(&read_file(Path::new(&path))?)?,
            Err(_) => PromptsConfig::bundled()?,
        };

        Ok(Self { config, prompts })
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub rag: RagConfig,
    pub limits: ContextLimits,
    pub ocr: OcrConfig,
    pub server: ServerConfig,
    pub cors: CorsConfig,
}

impl Config {
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            what: "settings".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("SERVER_PORT={port}")))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(ConfigError::Invalid(
                "rag.chunk_overlap must be smaller than rag.chunk_size".to_string(),
            ));
        }
        if self.rag.top_k == 0 {
            return Err(ConfigError::Invalid("rag.top_k must be positive".to_string()));
        }
        if self.server.session_ttl_seconds == 0 {
            return Err(ConfigError::Invalid(
                "server.session_ttl_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub study_temperature: f64,
    pub chat_temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash-preview-04-17".to_string(),
            study_temperature: 0.5,
            chat_temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-004".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 300,
            top_k: 3,
        }
    }
}

/// Character ceilings for whole-document prompts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextLimits {
    pub summary_chars: usize,
    pub flashcard_chars: usize,
    pub practice_chars: usize,
    pub source_excerpt_chars: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            summary_chars: 500_000,
            flashcard_chars: 300_000,
            practice_chars: 700_000,
            source_excerpt_chars: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub model: String,
    pub timeout_seconds: u64,
    pub preview_chars: usize,
    pub api_base: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash-preview-04-17".to_string(),
            timeout_seconds: 600,
            preview_chars: 1000,
            api_base: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Idle time after which a session and its document are dropped.
    pub session_ttl_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            session_ttl_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptsConfig {
    pub chat: ChatPrompts,
    pub summary: SummaryPrompts,
    pub flashcards: FlashcardPrompts,
    pub practice_questions: PracticePrompts,
    pub ocr: OcrPrompts,
}

impl PromptsConfig {
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            what: "prompts".to_string(),
            source,
        })
    }

    /// Templates shipped in `config/prompts.yaml`.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_yaml(BUNDLED_PROMPTS)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatPrompts {
    pub template: String,
    pub no_history: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryPrompts {
    pub template: String,
    pub short: String,
    pub medium: String,
    pub detailed: String,
}

impl SummaryPrompts {
    pub fn instruction(&self, length: SummaryLength) -> &str {
        match length {
            SummaryLength::Short => &self.short,
            SummaryLength::Medium => &self.medium,
            SummaryLength::Detailed => &self.detailed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlashcardPrompts {
    pub template: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PracticePrompts {
    pub template: String,
    pub no_style_guide: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrPrompts {
    pub instructions: Vec<String>,
}

/// Fills `{name}` placeholders in a single pass.
///
/// Substituted values are never rescanned, so document text containing brace
/// sequences is inserted verbatim. Unknown placeholders are left as-is.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });

        match replacement {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// The Gemini API key.
#[derive(Clone)]
pub struct GeminiCredentials {
    api_key: String,
}

impl std::fmt::Debug for GeminiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiCredentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Secrets file (`SECRETS_FILE`, default `config/secrets.yaml`) first,
    /// then the process environment.
    pub fn resolve() -> Result<Self, ConfigError> {
        let secrets_path = std::env::var("SECRETS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SECRETS_PATH));

        let from_secrets = if secrets_path.exists() {
            let secrets: HashMap<String, String> =
                serde_yaml::from_str(&read_file(&secrets_path)?).map_err(|source| {
                    ConfigError::Parse {
                        what: "secrets".to_string(),
                        source,
                    }
                })?;
            secrets.get(API_KEY_NAME).cloned()
        } else {
            None
        };

        Self::pick(from_secrets, std::env::var(API_KEY_NAME).ok())
    }

    fn pick(from_secrets: Option<String>, from_env: Option<String>) -> Result<Self, ConfigError> {
        from_secrets
            .filter(|k| !k.trim().is_empty())
            .or_else(|| from_env.filter(|k| !k.trim().is_empty()))
            .map(Self::new)
            .ok_or_else(|| ConfigError::MissingCredential(API_KEY_NAME.to_string()))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Publishes the key under `GEMINI_API_KEY`, the variable rig's Gemini
    /// provider reads. Call before the async runtime starts.
    pub fn export_for_provider(&self) {
        std::env::set_var(PROVIDER_KEY_NAME, &self.api_key);
    }
}
