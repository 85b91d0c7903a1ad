use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ax::ax_model::AxRole;
use crate::classify::classifier::Container;
use crate::classify::field_model::FieldKey;
use crate::fill::executor::FillSettings;

pub const DEFAULT_MAX_TABS: u32 = 300;
pub const DEFAULT_LOOP_DETECT_THRESHOLD: usize = 3;
pub const DEFAULT_STUCK_LIMIT: u32 = 3;
pub const DEFAULT_TOP_N: usize = 3;

/// Label used when neither the container nor the node has a name.
pub const UNLABELED_FIELD: &str = "<unlabeled-field>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    MaxSteps,
    LoopDetected,
    FocusStuck,
    AdvanceFailed,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::MaxSteps => "max_steps",
            TerminationReason::LoopDetected => "loop_detected",
            TerminationReason::FocusStuck => "focus_stuck",
            TerminationReason::AdvanceFailed => "advance_failed",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerState {
    Scanning,
    AtField,
    AtContainerOnly,
    Advancing,
    Done(TerminationReason),
}

impl std::fmt::Display for WalkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalkerState::Scanning => f.write_str("scanning"),
            WalkerState::AtField => f.write_str("at_field"),
            WalkerState::AtContainerOnly => f.write_str("at_container_only"),
            WalkerState::Advancing => f.write_str("advancing"),
            WalkerState::Done(reason) => write!(f, "done({})", reason),
        }
    }
}

/// Knobs of one walk.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Hard ceiling on focus advances.
    pub max_tabs: u32,
    /// Distinct labels required before returning to the first one counts as a loop.
    pub loop_detect_threshold: usize,
    /// Consecutive advances on the same key before giving up.
    pub stuck_limit: u32,
    pub fill: FillSettings,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_tabs: DEFAULT_MAX_TABS,
            loop_detect_threshold: DEFAULT_LOOP_DETECT_THRESHOLD,
            stuck_limit: DEFAULT_STUCK_LIMIT,
            fill: FillSettings::default(),
        }
    }
}

/// What the walker saw at one focus stop. Dropped at the end of the step.
#[derive(Debug, Clone)]
pub struct FocusStep {
    /// (role, name) of the focused node, used to look up its planned value.
    pub key: FieldKey,
    /// Visit identity: the node key, qualified by the container label for
    /// grouped controls so equal option names in different groups differ.
    pub identity: FieldKey,
    pub role: AxRole,
    pub name: String,
    pub editable: bool,
    pub container: Container,
    /// Container label when the control is grouped, empty otherwise.
    pub container_label: String,
    pub stable_label: String,
}

/// Bookkeeping of one walk, reset per run.
#[derive(Debug, Clone, Default)]
pub struct TraversalState {
    pub visited_keys: HashSet<FieldKey>,
    pub recorded_labels: HashSet<String>,
    /// Distinct stable labels in first-seen order.
    pub unique_stable_labels: Vec<String>,
    pub first_stable_label: Option<String>,
    pub last_container_label: Option<String>,
    pub last_key: Option<FieldKey>,
    pub stuck_count: u32,
    pub tabs_sent: u32,
    pub backtracked: bool,
    pub termination: Option<TerminationReason>,
}

impl TraversalState {
    /// Remember a stable label for loop detection.
    pub fn note_label(&mut self, label: &str) {
        if self.first_stable_label.is_none() {
            self.first_stable_label = Some(label.to_string());
        }
        if !self.unique_stable_labels.iter().any(|l| l == label) {
            self.unique_stable_labels.push(label.to_string());
        }
    }

    /// Track consecutive observations of the same key after an advance.
    pub fn note_key(&mut self, key: Option<&FieldKey>) {
        match key {
            Some(k) if self.last_key.as_ref() == Some(k) => self.stuck_count += 1,
            _ => self.stuck_count = 0,
        }
        self.last_key = key.cloned();
    }

    pub fn record_label(&mut self, label: &str) {
        self.recorded_labels.insert(label.to_string());
    }

    /// Recorded labels, sorted.
    pub fn unique_fields(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.recorded_labels.iter().cloned().collect();
        labels.sort();
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_counts_as_stuck_only_when_consecutive() {
        let a = FieldKey::new(AxRole::Textbox, "a");
        let b = FieldKey::new(AxRole::Textbox, "b");
        let mut t = TraversalState::default();
        t.note_key(Some(&a));
        t.note_key(Some(&a));
        t.note_key(Some(&a));
        assert_eq!(t.stuck_count, 2);
        t.note_key(Some(&b));
        assert_eq!(t.stuck_count, 0);
        t.note_key(None);
        t.note_key(None);
        assert_eq!(t.stuck_count, 0);
    }

    #[test]
    fn termination_reason_serializes_snake_case() {
        let yaml = serde_yaml::to_string(&TerminationReason::LoopDetected).unwrap();
        assert_eq!(yaml.trim(), "loop_detected");
    }
}
