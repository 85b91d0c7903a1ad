use serde::{Deserialize, Serialize};

/// One fill attempt, as written to the fill log.
///
/// Exactly one of `typed`, `selected` or `toggled_to` is set. `confirmed` is
/// always present: `true` / `false` after a verification, `null` when the
/// outcome could not be observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggled_to: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,
    pub confirmed: Option<bool>,
}

impl EventRecord {
    fn blank(field: &str, confirmed: Option<bool>) -> Self {
        Self {
            field: field.to_string(),
            typed: None,
            selected: None,
            toggled_to: None,
            tokens: None,
            confirmed,
        }
    }

    pub fn typed(field: &str, text: &str, confirmed: Option<bool>) -> Self {
        Self {
            typed: Some(text.to_string()),
            ..Self::blank(field, confirmed)
        }
    }

    /// Chip input: the raw text plus each token actually committed.
    pub fn chips(field: &str, text: &str, tokens: Vec<String>, confirmed: Option<bool>) -> Self {
        Self {
            typed: Some(text.to_string()),
            tokens: Some(tokens),
            ..Self::blank(field, confirmed)
        }
    }

    pub fn selected(field: &str, option: &str, confirmed: Option<bool>) -> Self {
        Self {
            selected: Some(option.to_string()),
            ..Self::blank(field, confirmed)
        }
    }

    pub fn toggled(field: &str, on: bool) -> Self {
        Self {
            toggled_to: Some(on),
            ..Self::blank(field, None)
        }
    }
}

/// Append-only event list for one run.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = EventRecord>) {
        self.events.extend(records);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn into_events(self) -> Vec<EventRecord> {
        self.events
    }
}
