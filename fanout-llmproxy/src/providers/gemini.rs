use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{read_envelope, require_credential, send_failure, status_failure};
use crate::config::ProviderConfig;
use crate::rewrite;
use crate::traits::{Completion, Credential, LlmProvider, ProviderError};

#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize, Debug)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug)]
struct GenerateEnvelope {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<GeminiError>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GeminiError {
    #[serde(default)]
    message: String,
    /// Symbolic status such as `INVALID_ARGUMENT` or `PERMISSION_DENIED`.
    status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    config: ProviderConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url(),
            self.config.model
        )
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn completion(
        &self,
        prompt: &str,
        credential: Option<&Credential>,
    ) -> Result<Completion, ProviderError> {
        let credential = require_credential(&self.config, credential)?;

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        tracing::debug!(provider = %self.config.id, model = %self.config.model, "POST generateContent");

        let res = self
            .client
            .post(self.url())
            .query(&[("key", credential.secret())])
            .json(&request)
            .send()
            .await
            .map_err(|e| send_failure(&self.config, e))?;

        let (status, envelope) = read_envelope::<GenerateEnvelope>(&self.config, res).await?;
        let Some(envelope) = envelope else {
            if status.is_success() {
                return Err(ProviderError::transport(
                    &self.config.display_name,
                    "unreadable response body",
                ));
            }
            return Err(status_failure(&self.config, status));
        };

        if let Some(error) = envelope.error {
            return Err(ProviderError::Api {
                provider: self.config.display_name.clone(),
                status: status.as_u16(),
                message: rewrite::GEMINI.rewrite(error.status.as_deref(), &error.message),
            });
        }
        if !status.is_success() {
            return Err(status_failure(&self.config, status));
        }

        let text = envelope
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text);

        Ok(Completion::new(text, self.config.model.clone()))
    }
}
