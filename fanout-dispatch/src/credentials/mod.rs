//! Named secrets, looked up by credential key. Presence is the only check
//! made here; shape checks belong to the provider config.

pub mod file;

pub use file::JsonFileCredentialStore;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use fanout_llmproxy::Credential;
use thiserror::Error;

/// Secrets of this length or shorter are ignored when seeding.
pub const MIN_SEED_LEN: usize = 10;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("failed to access credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credential file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Credential>, CredentialError>;

    /// Stores a trimmed secret. Blank secrets are ignored.
    fn set(&self, key: &str, secret: &str) -> Result<(), CredentialError>;

    fn remove(&self, key: &str) -> Result<(), CredentialError>;

    /// Everything currently stored, read once per dispatch.
    fn snapshot(&self) -> Result<HashMap<String, Credential>, CredentialError>;
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<Credential>, CredentialError> {
        let secrets = self.secrets.read().unwrap_or_else(PoisonError::into_inner);
        Ok(secrets.get(key).map(|secret| Credential::new(key, secret.clone())))
    }

    fn set(&self, key: &str, secret: &str) -> Result<(), CredentialError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Ok(());
        }
        self.secrets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), secret.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CredentialError> {
        self.secrets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    fn snapshot(&self) -> Result<HashMap<String, Credential>, CredentialError> {
        let secrets = self.secrets.read().unwrap_or_else(PoisonError::into_inner);
        Ok(secrets
            .iter()
            .map(|(key, secret)| (key.clone(), Credential::new(key.clone(), secret.clone())))
            .collect())
    }
}

/// Startup housekeeping: store a configured seed secret and drop keys that
/// older versions wrote.
pub fn prepare_store(
    store: &dyn CredentialStore,
    seed: Option<(&str, &str)>,
    legacy_keys: &[String],
) -> Result<(), CredentialError> {
    if let Some((key, secret)) = seed {
        let secret = secret.trim();
        if secret.len() > MIN_SEED_LEN {
            store.set(key, secret)?;
            tracing::debug!(key, "seeded credential from configuration");
        }
    }
    for key in legacy_keys {
        store.remove(key)?;
    }
    Ok(())
}
