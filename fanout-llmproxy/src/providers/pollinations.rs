use async_trait::async_trait;
use reqwest::Client;

use super::{send_failure, status_failure};
use crate::config::ProviderConfig;
use crate::traits::{Completion, Credential, LlmProvider, ProviderError};

/// Free-tier text endpoint: the prompt travels in the URL path and the body
/// comes back as plain text.
#[derive(Debug, Clone)]
pub struct PollinationsProvider {
    config: ProviderConfig,
    client: Client,
}

impl PollinationsProvider {
    pub fn new(config: ProviderConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn url(&self, prompt: &str) -> String {
        format!("{}/{}", self.config.base_url(), urlencoding::encode(prompt))
    }
}

#[async_trait]
impl LlmProvider for PollinationsProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn completion(
        &self,
        prompt: &str,
        _credential: Option<&Credential>,
    ) -> Result<Completion, ProviderError> {
        tracing::debug!(provider = %self.config.id, model = %self.config.model, "GET completion");

        let res = self
            .client
            .get(self.url(prompt))
            .query(&[("model", self.config.model.as_str())])
            .send()
            .await
            .map_err(|e| send_failure(&self.config, e))?;

        if !res.status().is_success() {
            return Err(status_failure(&self.config, res.status()));
        }

        let text = res
            .text()
            .await
            .map_err(|e| send_failure(&self.config, e))?;

        Ok(Completion::new(Some(text), self.config.model.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;
    use crate::traits::NO_RESPONSE_TEXT;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> PollinationsProvider {
        let config = ProviderConfig::new("free", "Pollinations", Provider::Pollinations, "openai")
            .with_base_url(server.uri());
        PollinationsProvider::new(config, Client::new())
    }

    #[test]
    fn prompt_is_percent_encoded_in_path() {
        let config = ProviderConfig::new("free", "Pollinations", Provider::Pollinations, "openai");
        let provider = PollinationsProvider::new(config, Client::new());
        assert_eq!(
            provider.url("what is 2+2? & why"),
            "https://text.pollinations.ai/what%20is%202%2B2%3F%20%26%20why"
        );
    }

    #[tokio::test]
    async fn returns_raw_text_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hello%20there"))
            .and(query_param("model", "openai"))
            .respond_with(ResponseTemplate::new(200).set_body_string("General Kenobi"))
            .expect(1)
            .mount(&server)
            .await;

        let completion = provider(&server).completion("hello there", None).await.unwrap();
        assert_eq!(completion.text, "General Kenobi");
        assert_eq!(completion.model, "openai");
    }

    #[tokio::test]
    async fn non_success_status_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = provider(&server).completion("hi", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport { .. }));
        assert!(err.to_string().starts_with("Pollinations failed:"));
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn empty_body_is_placeholder_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let completion = provider(&server).completion("hi", None).await.unwrap();
        assert_eq!(completion.text, NO_RESPONSE_TEXT);
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_failure() {
        let config = ProviderConfig::new("free", "Pollinations", Provider::Pollinations, "openai")
            .with_base_url("http://127.0.0.1:1");
        let provider = PollinationsProvider::new(config, Client::new());

        let outcome = provider.call("hi", None).await;
        assert!(!outcome.is_success());
    }
}
