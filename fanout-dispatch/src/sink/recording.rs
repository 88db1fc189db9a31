use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::{OutputSink, SkipReason};

#[derive(Debug, Clone, PartialEq)]
pub enum SlotState {
    Pending { display_name: String },
    Result { text: String, elapsed: Duration },
    Error { message: String },
    Skipped(SkipReason),
}

impl SlotState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SlotState::Pending { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SinkEvent {
    pub provider_id: String,
    pub state: SlotState,
}

/// In-memory sink: one slot per provider (last write wins) plus the ordered
/// log of every notification.
#[derive(Debug, Default)]
pub struct RecordingSink {
    slots: Mutex<HashMap<String, SlotState>>,
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, provider_id: &str) -> Option<SlotState> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider_id)
            .cloned()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Identifiers in the order their terminal notifications arrived.
    pub fn terminal_order(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|event| event.state.is_terminal())
            .map(|event| event.provider_id)
            .collect()
    }

    fn record(&self, provider_id: &str, state: SlotState) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider_id.to_string(), state.clone());
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SinkEvent {
                provider_id: provider_id.to_string(),
                state,
            });
    }
}

impl OutputSink for RecordingSink {
    fn show_pending(&self, provider_id: &str, display_name: &str) {
        self.record(
            provider_id,
            SlotState::Pending {
                display_name: display_name.to_string(),
            },
        );
    }

    fn show_result(&self, provider_id: &str, text: &str, elapsed: Duration) {
        self.record(
            provider_id,
            SlotState::Result {
                text: text.to_string(),
                elapsed,
            },
        );
    }

    fn show_error(&self, provider_id: &str, message: &str) {
        self.record(
            provider_id,
            SlotState::Error {
                message: message.to_string(),
            },
        );
    }

    fn show_skipped(&self, provider_id: &str, reason: &SkipReason) {
        self.record(provider_id, SlotState::Skipped(reason.clone()));
    }
}
