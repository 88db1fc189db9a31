use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{read_envelope, require_credential, send_failure, status_failure};
use crate::config::ProviderConfig;
use crate::rewrite;
use crate::traits::{Completion, Credential, LlmProvider, ProviderError};

const DEFAULT_TEMPERATURE: f32 = 0.7;

// --- Groq (OpenAI-compatible) API Structures ---

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    model: &'a str,
    temperature: f32,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Success and error bodies share one envelope; `error` wins when present.
#[derive(Deserialize, Debug)]
struct ChatEnvelope {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    code: Option<String>,
}

// --- Provider Implementation ---

#[derive(Debug, Clone)]
pub struct GroqProvider {
    config: ProviderConfig,
    client: Client,
}

impl GroqProvider {
    pub fn new(config: ProviderConfig, client: Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn completion(
        &self,
        prompt: &str,
        credential: Option<&Credential>,
    ) -> Result<Completion, ProviderError> {
        let credential = require_credential(&self.config, credential)?;

        let request = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            model: &self.config.model,
            temperature: DEFAULT_TEMPERATURE,
        };

        let url = format!("{}/chat/completions", self.config.base_url());
        tracing::debug!(provider = %self.config.id, model = %self.config.model, "POST chat completion");

        let res = self
            .client
            .post(&url)
            .bearer_auth(credential.secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| send_failure(&self.config, e))?;

        let (status, envelope) = read_envelope::<ChatEnvelope>(&self.config, res).await?;
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
                message: rewrite::GROQ.rewrite(error.code.as_deref(), &error.message),
            });
        }
        if !status.is_success() {
            return Err(status_failure(&self.config, status));
        }

        let text = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);

        Ok(Completion::new(text, self.config.model.clone()))
    }
}
