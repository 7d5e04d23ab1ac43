use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DocumentChunk;

/// Append-only chat transcript for the active document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub turns: Vec<ChatTurn>,
    pub updated_at: DateTime<Utc>,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
        self.updated_at = Utc::now();
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.updated_at = Utc::now();
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Renders prior turns as `Previous <role>: <content>` lines.
    pub fn history_lines(&self) -> Vec<String> {
        self.turns
            .iter()
            .map(|t| format!("Previous {}: {}", t.role.as_str(), t.content))
            .collect()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub sources: Option<Vec<DocumentChunk>>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            sources: None,
        }
    }

    pub fn ai(content: impl Into<String>, sources: Option<Vec<DocumentChunk>>) -> Self {
        Self {
            role: ChatRole::Ai,
            content: content.into(),
            sources,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ai => "ai",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_lines() {
        let mut transcript = Transcript::new();
        transcript.push(ChatTurn::user("What is osmosis?"));
        transcript.push(ChatTurn::ai("Diffusion of water.", None));

        assert_eq!(
            transcript.history_lines(),
            vec![
                "Previous user: What is osmosis?".to_string(),
                "Previous ai: Diffusion of water.".to_string(),
            ]
        );
    }

    #[test]
    fn test_clear() {
        let mut transcript = Transcript::new();
        transcript.push(ChatTurn::user("hi"));
        transcript.clear();
        assert!(transcript.is_empty());
    }
}
