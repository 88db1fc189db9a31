//! Where per-provider states end up. Every method is keyed by provider
//! identifier and only ever touches that identifier's slot.

pub mod recording;
pub mod render;
pub mod terminal;

pub use recording::{RecordingSink, SinkEvent, SlotState};
pub use render::{MarkdownRenderer, PlainRenderer, RenderError, Renderer};
pub use terminal::TerminalSink;

use std::fmt;
use std::time::Duration;

/// Why a provider was left out of a dispatch without a network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingCredential { credential_key: String },
    InvalidCredential { message: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingCredential { credential_key } => {
                write!(f, "not configured: no {credential_key} key")
            }
            SkipReason::InvalidCredential { message } => f.write_str(message),
        }
    }
}

pub trait OutputSink: Send + Sync {
    fn show_pending(&self, provider_id: &str, display_name: &str);

    fn show_result(&self, provider_id: &str, text: &str, elapsed: Duration);

    fn show_error(&self, provider_id: &str, message: &str);

    /// Terminal state for providers that were never called.
    fn show_skipped(&self, provider_id: &str, reason: &SkipReason);
}

/// `1.234s` -> `1.23s`
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_has_two_decimals() {
        assert_eq!(format_elapsed(Duration::from_millis(1234)), "1.23s");
        assert_eq!(format_elapsed(Duration::from_millis(100)), "0.10s");
    }

    #[test]
    fn skip_reason_display() {
        let missing = SkipReason::MissingCredential {
            credential_key: "groq".into(),
        };
        assert_eq!(missing.to_string(), "not configured: no groq key");

        let invalid = SkipReason::InvalidCredential {
            message: "bad key".into(),
        };
        assert_eq!(invalid.to_string(), "bad key");
    }
}
