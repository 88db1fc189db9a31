use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use fanout_llmproxy::Credential;

use super::{CredentialError, CredentialStore};

/// Flat `{"key": "secret"}` JSON file. Plain text, no expiry.
#[derive(Debug)]
pub struct JsonFileCredentialStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CredentialError {
        CredentialError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(self.io_error(err)),
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|source| CredentialError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, secrets: &BTreeMap<String, String>) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        let json = serde_json::to_string_pretty(secrets).map_err(|source| CredentialError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|e| self.io_error(e))
    }
}

impl CredentialStore for JsonFileCredentialStore {
    fn get(&self, key: &str) -> Result<Option<Credential>, CredentialError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self
            .load()?
            .remove(key)
            .map(|secret| Credential::new(key, secret)))
    }

    fn set(&self, key: &str, secret: &str) -> Result<(), CredentialError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Ok(());
        }
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut secrets = self.load()?;
        secrets.insert(key.to_string(), secret.to_string());
        self.save(&secrets)
    }

    fn remove(&self, key: &str) -> Result<(), CredentialError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut secrets = self.load()?;
        if secrets.remove(key).is_some() {
            self.save(&secrets)?;
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<HashMap<String, Credential>, CredentialError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self
            .load()?
            .into_iter()
            .map(|(key, secret)| {
                let credential = Credential::new(key.clone(), secret);
                (key, credential)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileCredentialStore::new(dir.path().join("credentials.json"));
        assert!(store.snapshot().unwrap().is_empty());
        assert!(store.get("groq").unwrap().is_none());
    }

    #[test]
    fn set_creates_parent_dirs_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("credentials.json");
        let store = JsonFileCredentialStore::new(&path);

        store.set("groq", "gsk_abc").unwrap();
        store.set("gemini", "AIza").unwrap();

        let reopened = JsonFileCredentialStore::new(&path);
        assert_eq!(reopened.get("groq").unwrap().unwrap().secret(), "gsk_abc");
        assert_eq!(reopened.snapshot().unwrap().len(), 2);

        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.get("gemini").map(String::as_str), Some("AIza"));
    }

    #[test]
    fn remove_deletes_only_that_key() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileCredentialStore::new(dir.path().join("c.json"));
        store.set("groq", "gsk_abc").unwrap();
        store.set("hf", "hf_x").unwrap();

        store.remove("hf").unwrap();
        store.remove("never-there").unwrap();

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["groq"].key(), "groq");
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileCredentialStore::new(&path);
        assert!(matches!(
            store.snapshot(),
            Err(CredentialError::Corrupt { .. })
        ));
    }
}
