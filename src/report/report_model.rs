use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FillError;
use crate::trace::event::EventRecord;
use crate::walker::walker::WalkOutcome;
use crate::walker::walker_model::TerminationReason;

// ============================================================================
// Fill report (form-fill-<ms>.yaml)
// ============================================================================

/// Everything a fill run produced.
///
/// Built from a `WalkOutcome` via `from_outcome()`. Written as the fill log
/// and consumed by the console summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillReport {
    /// Why the walk stopped
    pub ended_reason: TerminationReason,

    pub loop_detected: bool,

    /// Whether one reverse step was issued on loop detection
    pub backtracked: bool,

    pub tabs_sent: u32,

    /// Labels of recorded fields, sorted
    pub unique_fields: Vec<String>,

    pub events: Vec<EventRecord>,

    /// Container label -> button names seen next to that field
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub buttons: BTreeMap<String, Vec<String>>,

    /// Fingerprint of the fields document the run was planned from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields_fingerprint: Option<String>,

    /// Body text at the end of the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_text: Option<String>,
}

impl FillReport {
    pub fn from_outcome(outcome: WalkOutcome) -> Self {
        let termination = outcome.termination;
        Self {
            ended_reason: termination,
            loop_detected: termination == TerminationReason::LoopDetected,
            backtracked: outcome.traversal.backtracked,
            tabs_sent: outcome.traversal.tabs_sent,
            unique_fields: outcome.traversal.unique_fields(),
            events: outcome.events.into_events(),
            buttons: outcome
                .buttons
                .into_iter()
                .map(|(label, names)| (label, names.into_iter().collect()))
                .collect(),
            fields_fingerprint: None,
            page_text: None,
        }
    }

    pub fn with_page_text(mut self, text: Option<String>) -> Self {
        self.page_text = text;
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.fields_fingerprint = fingerprint;
        self
    }

    /// (confirmed, mismatched, unknown) event counts.
    pub fn confirmation_counts(&self) -> (usize, usize, usize) {
        self.events
            .iter()
            .fold((0, 0, 0), |(yes, no, unknown), e| match e.confirmed {
                Some(true) => (yes + 1, no, unknown),
                Some(false) => (yes, no + 1, unknown),
                None => (yes, no, unknown + 1),
            })
    }

    pub fn save(&self, path: &Path) -> Result<(), FillError> {
        let yaml =
            serde_yaml::to_string(self).map_err(|e| FillError::yaml("serializing fill report", e))?;
        std::fs::write(path, yaml).map_err(|e| FillError::io(format!("writing {}", path.display()), e))
    }

    pub fn load(path: &Path) -> Result<Self, FillError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FillError::io(format!("reading {}", path.display()), e))?;
        serde_yaml::from_str(&content)
            .map_err(|e| FillError::yaml(format!("parsing {}", path.display()), e))
    }
}
