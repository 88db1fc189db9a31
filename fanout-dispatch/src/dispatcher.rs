//! Fan-out of one prompt to every configured provider.
//!
//! Each dispatch gets a generation number. Providers lacking a usable
//! credential are reported as skipped straight away. Every other provider
//! gets its own task, and its outcome reaches the sink as soon as it
//! resolves, in whatever order the providers answer. There is no timeout,
//! retry or cancellation; an older dispatch may still overwrite a slot that a
//! newer one has reset to pending.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fanout_llmproxy::{
    Credential, LlmProvider, OutcomeStatus, ProviderConfig, ProviderError, ProviderOutcome,
    get_provider,
};
use futures::future::join_all;
use reqwest::Client;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::settings::Settings;
use crate::sink::{OutputSink, SkipReason};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Type a prompt first: the prompt must not be empty")]
    EmptyPrompt,
    #[error("dispatch must run inside a Tokio runtime")]
    NoRuntime,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// One submission: the prompt and what each provider will be called with.
#[derive(Debug)]
pub struct DispatchRequest {
    pub generation: u64,
    pub prompt: Arc<str>,
    pub targets: Vec<Target>,
}

#[derive(Debug)]
pub struct Target {
    pub provider_id: String,
    pub admission: Result<Option<Credential>, SkipReason>,
}

/// A spawned provider call, tagged with the dispatch it belongs to.
#[derive(Debug)]
pub struct DispatchTask {
    pub provider_id: String,
    pub generation: u64,
    handle: JoinHandle<ProviderOutcome>,
}

/// The tasks started by one dispatch. Dropping it detaches them; nothing is
/// cancelled.
#[derive(Debug)]
pub struct DispatchHandle {
    generation: u64,
    skipped: Vec<String>,
    tasks: Vec<DispatchTask>,
}

impl DispatchHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tasks(&self) -> &[DispatchTask] {
        &self.tasks
    }

    /// Providers that got a skipped notification instead of a request.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Waits for every task. Results come back in provider order; the sink has
    /// already seen them in completion order.
    pub async fn join(self) -> Vec<ProviderOutcome> {
        let ids: Vec<String> = self.tasks.iter().map(|t| t.provider_id.clone()).collect();
        let generation = self.generation;
        let results = join_all(self.tasks.into_iter().map(|t| t.handle)).await;
        results
            .into_iter()
            .zip(ids)
            .map(|(result, id)| {
                result.unwrap_or_else(|err| {
                    ProviderOutcome::failure(id, format!("task failed: {err}"), Default::default())
                        .with_generation(generation)
                })
            })
            .collect()
    }
}

pub struct Dispatcher {
    providers: Vec<Arc<dyn LlmProvider>>,
    sink: Arc<dyn OutputSink>,
    generation: AtomicU64,
}

impl Dispatcher {
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            providers,
            sink,
            generation: AtomicU64::new(0),
        }
    }

    /// Builds one adapter per configured provider, all sharing `client`.
    pub fn from_settings(
        settings: &Settings,
        client: Client,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self, DispatchError> {
        let providers = settings
            .providers()
            .iter()
            .map(|config| get_provider(config.clone(), client.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(providers, sink))
    }

    /// Decides, without touching the network, how each provider takes part.
    pub fn prepare(
        &self,
        prompt: &str,
        credentials: &HashMap<String, Credential>,
    ) -> Result<DispatchRequest, DispatchError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(DispatchError::EmptyPrompt);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let targets = self
            .providers
            .iter()
            .map(|provider| {
                let config = provider.config();
                Target {
                    provider_id: config.id.clone(),
                    admission: admit(config, credentials),
                }
            })
            .collect();

        Ok(DispatchRequest {
            generation,
            prompt: Arc::from(prompt),
            targets,
        })
    }

    /// Sends `prompt` to every provider. Must be called from within a Tokio
    /// runtime; outcomes are delivered to the sink as they resolve.
    pub fn dispatch(
        &self,
        prompt: &str,
        credentials: &HashMap<String, Credential>,
    ) -> Result<DispatchHandle, DispatchError> {
        let runtime = Handle::try_current().map_err(|_| DispatchError::NoRuntime)?;
        let request = self.prepare(prompt, credentials)?;
        let generation = request.generation;

        let mut tasks = Vec::new();
        let mut skipped = Vec::new();

        for (provider, target) in self.providers.iter().zip(request.targets) {
            let config = provider.config();
            let credential = match target.admission {
                Ok(credential) => credential,
                Err(reason) => {
                    tracing::warn!(provider = %config.id, generation, %reason, "provider skipped");
                    self.sink.show_skipped(&config.id, &reason);
                    skipped.push(target.provider_id);
                    continue;
                }
            };

            self.sink.show_pending(&config.id, &config.display_name);
            let handle = runtime.spawn(run_provider(
                Arc::clone(provider),
                Arc::clone(&self.sink),
                Arc::clone(&request.prompt),
                credential,
                generation,
            ));
            tasks.push(DispatchTask {
                provider_id: target.provider_id,
                generation,
                handle,
            });
        }

        tracing::debug!(generation, started = tasks.len(), skipped = skipped.len(), "dispatch issued");
        Ok(DispatchHandle {
            generation,
            skipped,
            tasks,
        })
    }
}

fn admit(
    config: &ProviderConfig,
    credentials: &HashMap<String, Credential>,
) -> Result<Option<Credential>, SkipReason> {
    if !config.requires_credential() {
        return Ok(None);
    }
    let credential = credentials
        .get(config.credential_key())
        .ok_or_else(|| SkipReason::MissingCredential {
            credential_key: config.credential_key().to_string(),
        })?;
    config
        .check_credential(credential)
        .map_err(|message| SkipReason::InvalidCredential { message })?;
    Ok(Some(credential.clone()))
}

async fn run_provider(
    provider: Arc<dyn LlmProvider>,
    sink: Arc<dyn OutputSink>,
    prompt: Arc<str>,
    credential: Option<Credential>,
    generation: u64,
) -> ProviderOutcome {
    let outcome = provider
        .call(&prompt, credential.as_ref())
        .await
        .with_generation(generation);
    let elapsed_ms = outcome.elapsed.as_millis() as u64;
    match &outcome.status {
        OutcomeStatus::Success { text } => {
            tracing::info!(provider = %outcome.provider_id, generation, elapsed_ms, "provider answered");
            sink.show_result(&outcome.provider_id, text, outcome.elapsed);
        }
        OutcomeStatus::Failure { message } => {
            tracing::warn!(provider = %outcome.provider_id, generation, elapsed_ms, error = %message, "provider failed");
            sink.show_error(&outcome.provider_id, message);
        }
    }
    outcome
}
