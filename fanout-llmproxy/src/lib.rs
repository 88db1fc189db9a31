pub mod config;
pub mod providers;
pub mod rewrite;
pub mod traits;

pub use config::{AuthScheme, ConfigError, Provider, ProviderConfig, validate_all};
pub use providers::{GeminiProvider, GroqProvider, PollinationsProvider};
pub use traits::{
    Completion, Credential, LlmProvider, NO_RESPONSE_TEXT, OutcomeStatus, ProviderError,
    ProviderOutcome,
};

use reqwest::Client;
use std::sync::Arc;

const USER_AGENT: &str = concat!("fanout/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for every adapter. No timeout is set beyond the
/// transport defaults.
pub fn build_client() -> Result<Client, ProviderError> {
    Ok(Client::builder().user_agent(USER_AGENT).build()?)
}

// A factory function to create a provider instance based on config
pub fn get_provider(config: ProviderConfig, client: Client) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    config.validate()?;

    match config.provider {
        Provider::Pollinations => Ok(Arc::new(PollinationsProvider::new(config, client))),
        Provider::Groq => Ok(Arc::new(GroqProvider::new(config, client))),
        Provider::Gemini => Ok(Arc::new(GeminiProvider::new(config, client))),
    }
}
