use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::walker::walker_model::WalkerState;

/// One walker iteration, as written to the JSONL step trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub step: u32,

    pub walker_state: String,

    pub focused: Option<String>,
    pub label: Option<String>,

    pub action: Option<String>,
    pub events: usize,
}

pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

impl TraceEvent {
    pub fn now(step: u32, state: &WalkerState) -> Self {
        Self {
            timestamp_ms: now_ms(),
            step,
            walker_state: state.to_string(),
            focused: None,
            label: None,
            action: None,
            events: 0,
        }
    }

    pub fn with_focused(mut self, key: impl ToString) -> Self {
        self.focused = Some(key.to_string());
        self
    }

    pub fn with_label(mut self, label: impl ToString) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_action(mut self, action: impl ToString) -> Self {
        self.action = Some(action.to_string());
        self
    }

    pub fn with_events(mut self, count: usize) -> Self {
        self.events = count;
        self
    }
}
