//! Sends one prompt to several LLM providers at once and reports each
//! provider's answer, failure or skip on its own as soon as it is known.
//!
//! - [`dispatcher`] owns the fan-out and per-provider task bookkeeping.
//! - [`sink`] is where per-provider states are shown.
//! - [`credentials`] stores provider secrets.
//! - [`settings`] builds the immutable startup configuration.

pub mod credentials;
pub mod dispatcher;
pub mod settings;
pub mod sink;

pub use credentials::{CredentialError, CredentialStore, JsonFileCredentialStore, MemoryCredentialStore};
pub use dispatcher::{DispatchError, DispatchHandle, Dispatcher};
pub use settings::{Settings, SettingsError};
pub use sink::{OutputSink, RecordingSink, SkipReason, TerminalSink};
