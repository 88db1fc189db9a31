use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::traits::Credential;

const POLLINATIONS_BASE_URL: &str = "https://text.pollinations.ai";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Which adapter talks to a configured endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Pollinations,
    Groq,
    Gemini,
}

impl Provider {
    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Pollinations => POLLINATIONS_BASE_URL,
            Provider::Groq => GROQ_BASE_URL,
            Provider::Gemini => GEMINI_BASE_URL,
        }
    }

    pub fn default_auth(self) -> AuthScheme {
        match self {
            Provider::Pollinations => AuthScheme::None,
            Provider::Groq => AuthScheme::Bearer,
            Provider::Gemini => AuthScheme::QueryKey,
        }
    }

    /// Shape check applied to stored keys before any request is made.
    pub fn default_credential_prefix(self) -> Option<&'static str> {
        match self {
            Provider::Groq => Some("gsk_"),
            Provider::Pollinations | Provider::Gemini => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Provider::Pollinations => "Pollinations",
            Provider::Groq => "Groq",
            Provider::Gemini => "Gemini",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthScheme {
    /// Free tier, no credential sent.
    None,
    /// `Authorization: Bearer <secret>`.
    Bearer,
    /// `?key=<secret>` on the request URL.
    QueryKey,
}

/// One output slot: an endpoint, a model and the credential it needs.
///
/// Several configs may share a credential through `credential_key`, e.g. two
/// Groq models both reading the `groq` secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub display_name: String,
    pub provider: Provider,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthScheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_prefix: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Provider identifier must not be empty")]
    EmptyIdentifier,
    #[error("Missing model identifier for provider: {0}")]
    MissingModel(String),
    #[error("Invalid base URL for provider {id}: {url}")]
    InvalidBaseUrl { id: String, url: String },
    #[error("Duplicate provider identifier: {0}")]
    DuplicateIdentifier(String),
}

impl ProviderConfig {
    // Basic constructor
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        provider: Provider,
        model: impl Into<String>,
    ) -> Self {
        ProviderConfig {
            id: id.into(),
            display_name: display_name.into(),
            provider,
            model: model.into(),
            base_url: None,
            auth: None,
            credential_key: None,
            credential_prefix: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_auth(mut self, auth: AuthScheme) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_credential_key(mut self, key: impl Into<String>) -> Self {
        self.credential_key = Some(key.into());
        self
    }

    pub fn with_credential_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.credential_prefix = Some(prefix.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }

    pub fn auth(&self) -> AuthScheme {
        self.auth.unwrap_or_else(|| self.provider.default_auth())
    }

    pub fn requires_credential(&self) -> bool {
        self.auth() != AuthScheme::None
    }

    /// Key under which the credential store holds this provider's secret.
    pub fn credential_key(&self) -> &str {
        self.credential_key.as_deref().unwrap_or(&self.id)
    }

    pub fn credential_prefix(&self) -> Option<&str> {
        self.credential_prefix
            .as_deref()
            .or_else(|| self.provider.default_credential_prefix())
    }

    /// Cheap syntactic check of a stored secret; no network involved.
    pub fn check_credential(&self, credential: &Credential) -> Result<(), String> {
        let secret = credential.secret().trim();
        if secret.is_empty() {
            return Err(format!("{} key is empty. Check your settings.", self.provider.label()));
        }
        if let Some(prefix) = self.credential_prefix() {
            if !secret.starts_with(prefix) {
                return Err(format!(
                    "Invalid {} key. It must start with \"{}\". Check your settings.",
                    self.provider.label(),
                    prefix
                ));
            }
        }
        Ok(())
    }

    // Validate the configuration based on the provider
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::EmptyIdentifier);
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingModel(self.id.clone()));
        }
        if Url::parse(self.base_url()).is_err() {
            return Err(ConfigError::InvalidBaseUrl {
                id: self.id.clone(),
                url: self.base_url().to_string(),
            });
        }
        Ok(())
    }
}

/// Validates every config and rejects identifiers that would share a sink slot.
pub fn validate_all(configs: &[ProviderConfig]) -> Result<(), ConfigError> {
    let mut seen = std::collections::HashSet::new();
    for config in configs {
        config.validate()?;
        if !seen.insert(config.id.as_str()) {
            return Err(ConfigError::DuplicateIdentifier(config.id.clone()));
        }
    }
    Ok(())
}
