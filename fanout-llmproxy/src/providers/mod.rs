// Declare provider implementation modules here
pub mod gemini;
pub mod groq;
pub mod pollinations;

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use pollinations::PollinationsProvider;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::ProviderConfig;
use crate::traits::{Credential, ProviderError};

/// Returns the credential or a `MissingCredential` error naming the provider.
fn require_credential<'a>(
    config: &ProviderConfig,
    credential: Option<&'a Credential>,
) -> Result<&'a Credential, ProviderError> {
    credential.ok_or_else(|| ProviderError::MissingCredential {
        provider: config.display_name.clone(),
    })
}

/// Reads the whole body and tries to decode a provider envelope from it.
///
/// The envelope is `None` when the body is not valid JSON for `T`; callers
/// decide whether that is a transport failure based on the status.
async fn read_envelope<T: DeserializeOwned>(
    config: &ProviderConfig,
    response: Response,
) -> Result<(StatusCode, Option<T>), ProviderError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| send_failure(config, e))?;
    let envelope = serde_json::from_str::<T>(&body).ok();
    if envelope.is_none() {
        tracing::debug!(provider = %config.id, %status, "response body is not a known envelope");
    }
    Ok((status, envelope))
}

/// Transport failure without the request URL, which may carry a query key.
fn send_failure(config: &ProviderConfig, err: reqwest::Error) -> ProviderError {
    ProviderError::transport(&config.display_name, err.without_url())
}

fn status_failure(config: &ProviderConfig, status: StatusCode) -> ProviderError {
    ProviderError::transport(&config.display_name, format!("HTTP {status}"))
}
