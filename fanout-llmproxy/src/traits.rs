use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::{ConfigError, ProviderConfig};

/// Shown when a provider answers successfully but carries no text.
pub const NO_RESPONSE_TEXT: &str = "No response.";

// --- Credentials ---

const REDACTED_PREFIX: usize = 4;

/// A stored secret plus the key it was stored under.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    key: String,
    secret: String,
}

impl Credential {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// First few characters followed by an ellipsis, for listings. Secrets too
    /// short to spare a prefix show only the ellipsis.
    pub fn redacted(&self) -> String {
        if self.secret.chars().count() <= REDACTED_PREFIX {
            return "…".to_string();
        }
        let visible: String = self.secret.chars().take(REDACTED_PREFIX).collect();
        format!("{visible}…")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

// --- Request/Response Structures ---

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub model: String,
}

impl Completion {
    /// A missing or blank completion is a degraded success, not an error.
    pub fn new(text: Option<String>, model: impl Into<String>) -> Self {
        let text = match text {
            Some(text) if !text.trim().is_empty() => text,
            _ => NO_RESPONSE_TEXT.to_string(),
        };
        Self {
            text,
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
    Success { text: String },
    Failure { message: String },
}

/// Terminal result of one provider call.
///
/// `generation` identifies the dispatch that produced it. Adapters leave it at
/// zero; the dispatcher stamps it with [`ProviderOutcome::with_generation`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutcome {
    pub provider_id: String,
    pub generation: u64,
    pub status: OutcomeStatus,
    pub elapsed: Duration,
}

impl ProviderOutcome {
    pub fn success(provider_id: impl Into<String>, text: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            provider_id: provider_id.into(),
            generation: 0,
            status: OutcomeStatus::Success { text: text.into() },
            elapsed,
        }
    }

    pub fn failure(provider_id: impl Into<String>, message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            provider_id: provider_id.into(),
            generation: 0,
            status: OutcomeStatus::Failure {
                message: message.into(),
            },
            elapsed,
        }
    }

    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success { .. })
    }
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} failed: {message}")]
    Transport { provider: String, message: String },
    #[error("{message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },
    #[error("{provider} is not configured: missing credential")]
    MissingCredential { provider: String },
    #[error("{reason}")]
    InvalidCredential { provider: String, reason: String },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl ProviderError {
    pub fn transport(provider: &str, message: impl fmt::Display) -> Self {
        ProviderError::Transport {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn config(&self) -> &ProviderConfig;

    /// Issues exactly one request for `prompt`.
    async fn completion(
        &self,
        prompt: &str,
        credential: Option<&Credential>,
    ) -> Result<Completion, ProviderError>;

    /// Times a single `completion` and folds every error into a failure outcome.
    async fn call(&self, prompt: &str, credential: Option<&Credential>) -> ProviderOutcome {
        let id = self.config().id.clone();
        let started = Instant::now();
        let result = self.completion(prompt, credential).await;
        let elapsed = started.elapsed();
        match result {
            Ok(completion) => ProviderOutcome::success(id, completion.text, elapsed),
            Err(err) => ProviderOutcome::failure(id, err.to_string(), elapsed),
        }
    }
}
