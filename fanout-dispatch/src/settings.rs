//! Immutable application settings, built once at startup.
//!
//! Layers, later wins: built-in defaults, a TOML file, then environment
//! variables (a `.env` file is loaded by the binary before this runs).

use std::path::{Path, PathBuf};

use fanout_llmproxy::{ConfigError, Provider, ProviderConfig, validate_all};
use serde::Deserialize;
use thiserror::Error;

pub const ENV_GROQ_KEY: &str = "FANOUT_GROQ_KEY";
pub const ENV_CREDENTIALS_PATH: &str = "FANOUT_CREDENTIALS_PATH";

/// Credential key the seed secret is stored under.
pub const GROQ_CREDENTIAL_KEY: &str = "groq";

const APP_DIR: &str = "fanout";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid provider configuration: {0}")]
    Provider(#[from] ConfigError),
    #[error("no providers configured")]
    NoProviders,
    #[error("could not determine a data directory for credentials")]
    NoDataDir,
}

/// Settings as stored in TOML (every field optional).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSettings {
    pub providers: Option<Vec<ProviderConfig>>,
    pub credentials_path: Option<PathBuf>,
    pub groq_key: Option<String>,
    pub legacy_credential_keys: Option<Vec<String>>,
}

/// Values read from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub groq_key: Option<String>,
    pub credentials_path: Option<PathBuf>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            groq_key: std::env::var(ENV_GROQ_KEY).ok().filter(|v| !v.trim().is_empty()),
            credentials_path: std::env::var_os(ENV_CREDENTIALS_PATH).map(PathBuf::from),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    providers: Vec<ProviderConfig>,
    credentials_path: PathBuf,
    groq_key: Option<String>,
    legacy_credential_keys: Vec<String>,
}

impl Settings {
    /// Loads `path` if given, otherwise the user config file when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let raw = match path {
            Some(path) => read_raw(path)?,
            None => match user_config_path() {
                Some(path) if path.exists() => read_raw(&path)?,
                _ => RawSettings::default(),
            },
        };
        let default_credentials = default_credentials_path();
        Self::from_parts(raw, EnvOverrides::from_env(), default_credentials)
    }

    pub fn from_parts(
        raw: RawSettings,
        env: EnvOverrides,
        default_credentials_path: Option<PathBuf>,
    ) -> Result<Self, SettingsError> {
        let providers = raw.providers.unwrap_or_else(default_providers);
        if providers.is_empty() {
            return Err(SettingsError::NoProviders);
        }
        validate_all(&providers)?;

        let credentials_path = env
            .credentials_path
            .or(raw.credentials_path)
            .or(default_credentials_path)
            .ok_or(SettingsError::NoDataDir)?;

        Ok(Self {
            providers,
            credentials_path,
            groq_key: env.groq_key.or(raw.groq_key),
            legacy_credential_keys: raw
                .legacy_credential_keys
                .unwrap_or_else(default_legacy_keys),
        })
    }

    pub fn providers(&self) -> &[ProviderConfig] {
        &self.providers
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    /// `(credential key, secret)` to seed into the store at startup.
    pub fn seed_credential(&self) -> Option<(&str, &str)> {
        self.groq_key
            .as_deref()
            .map(|secret| (GROQ_CREDENTIAL_KEY, secret))
    }

    pub fn legacy_credential_keys(&self) -> &[String] {
        &self.legacy_credential_keys
    }
}

fn read_raw(path: &Path) -> Result<RawSettings, SettingsError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

pub fn default_credentials_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR).join("credentials.json"))
}

/// The free Pollinations model, two Groq models sharing one key, and Gemini.
pub fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new("pollinations", "Pollinations (GPT-4o mini)", Provider::Pollinations, "openai"),
        ProviderConfig::new("groq1", "Llama 3.3 (Smart)", Provider::Groq, "llama-3.3-70b-versatile")
            .with_credential_key(GROQ_CREDENTIAL_KEY),
        ProviderConfig::new("groq2", "Llama 3.1 (Fast)", Provider::Groq, "llama-3.1-8b-instant")
            .with_credential_key(GROQ_CREDENTIAL_KEY),
        ProviderConfig::new("gemini", "Gemini 1.5 Flash", Provider::Gemini, "gemini-1.5-flash"),
    ]
}

fn default_legacy_keys() -> Vec<String> {
    vec!["hf".to_string(), "gemini_legacy".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_llmproxy::AuthScheme;
    use tempfile::TempDir;

    fn fallback() -> Option<PathBuf> {
        Some(PathBuf::from("/tmp/fanout/credentials.json"))
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        let settings = Settings::from_parts(RawSettings::default(), EnvOverrides::default(), fallback()).unwrap();

        let ids: Vec<&str> = settings.providers().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["pollinations", "groq1", "groq2", "gemini"]);
        assert_eq!(settings.providers()[1].credential_key(), "groq");
        assert_eq!(settings.providers()[2].credential_key(), "groq");
        assert_eq!(settings.credentials_path(), Path::new("/tmp/fanout/credentials.json"));
        assert!(settings.seed_credential().is_none());
        assert_eq!(settings.legacy_credential_keys(), ["hf", "gemini_legacy"]);
    }

    #[test]
    fn env_overrides_file_values() {
        let raw = RawSettings {
            credentials_path: Some(PathBuf::from("/from/file.json")),
            groq_key: Some("gsk_from_file_1234".into()),
            ..RawSettings::default()
        };
        let env = EnvOverrides {
            groq_key: Some("gsk_from_env_5678".into()),
            credentials_path: Some(PathBuf::from("/from/env.json")),
        };

        let settings = Settings::from_parts(raw, env, fallback()).unwrap();
        assert_eq!(settings.credentials_path(), Path::new("/from/env.json"));
        assert_eq!(settings.seed_credential(), Some(("groq", "gsk_from_env_5678")));
    }

    #[test]
    fn toml_file_replaces_provider_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
credentials_path = "/var/lib/fanout/keys.json"
legacy_credential_keys = []

[[providers]]
id = "local"
display_name = "Local chat"
provider = "groq"
model = "llama3"
base_url = "http://localhost:8080/v1"
auth = "none"
"#,
        )
        .unwrap();

        let raw = read_raw(&path).unwrap();
        let settings = Settings::from_parts(raw, EnvOverrides::default(), fallback()).unwrap();

        assert_eq!(settings.providers().len(), 1);
        let local = &settings.providers()[0];
        assert_eq!(local.auth(), AuthScheme::None);
        assert_eq!(local.base_url(), "http://localhost:8080/v1");
        assert!(settings.legacy_credential_keys().is_empty());
    }

    #[test]
    fn invalid_providers_are_rejected() {
        let duplicate = RawSettings {
            providers: Some(vec![
                ProviderConfig::new("a", "A", Provider::Pollinations, "openai"),
                ProviderConfig::new("a", "A again", Provider::Pollinations, "openai"),
            ]),
            ..RawSettings::default()
        };
        assert!(matches!(
            Settings::from_parts(duplicate, EnvOverrides::default(), fallback()),
            Err(SettingsError::Provider(ConfigError::DuplicateIdentifier(_)))
        ));

        let empty = RawSettings {
            providers: Some(vec![]),
            ..RawSettings::default()
        };
        assert!(matches!(
            Settings::from_parts(empty, EnvOverrides::default(), fallback()),
            Err(SettingsError::NoProviders)
        ));
    }

    #[test]
    fn missing_data_dir_is_an_error() {
        assert!(matches!(
            Settings::from_parts(RawSettings::default(), EnvOverrides::default(), None),
            Err(SettingsError::NoDataDir)
        ));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "providers = 3").unwrap();
        assert!(matches!(read_raw(&path), Err(SettingsError::Parse { .. })));
    }
}
