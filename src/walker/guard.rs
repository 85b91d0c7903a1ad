use crate::walker::walker_model::{TerminationReason, TraversalState, WalkerConfig};

#[derive(Debug, PartialEq)]
pub enum GuardDecision {
    Allow,
    Block(TerminationReason),
}

/// Back at the first label after enough distinct labels, with at least one
/// field recorded: the focus order has wrapped around.
pub fn check_loop(state: &TraversalState, stable_label: &str, config: &WalkerConfig) -> GuardDecision {
    let wrapped = state.first_stable_label.as_deref() == Some(stable_label)
        && state.unique_stable_labels.len() >= config.loop_detect_threshold
        && !state.recorded_labels.is_empty();

    if wrapped {
        return GuardDecision::Block(TerminationReason::LoopDetected);
    }
    GuardDecision::Allow
}

/// Evaluated before every step, so a zero budget sends no counted advance.
pub fn check_progress(state: &TraversalState, config: &WalkerConfig) -> GuardDecision {
    // ---- Stuck focus ----
    if state.stuck_count >= config.stuck_limit {
        return GuardDecision::Block(TerminationReason::FocusStuck);
    }

    // ---- Step budget ----
    if state.tabs_sent >= config.max_tabs {
        return GuardDecision::Block(TerminationReason::MaxSteps);
    }

    GuardDecision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_needs_threshold_and_a_recorded_field() {
        let config = WalkerConfig::default();
        let mut state = TraversalState::default();
        for label in ["A", "B"] {
            state.note_label(label);
        }
        state.record_label("A");
        assert_eq!(check_loop(&state, "A", &config), GuardDecision::Allow);

        state.note_label("C");
        assert_eq!(
            check_loop(&state, "A", &config),
            GuardDecision::Block(TerminationReason::LoopDetected)
        );
        assert_eq!(check_loop(&state, "B", &config), GuardDecision::Allow);

        state.recorded_labels.clear();
        assert_eq!(check_loop(&state, "A", &config), GuardDecision::Allow);
    }

    #[test]
    fn progress_blocks_on_stuck_before_budget() {
        let config = WalkerConfig {
            max_tabs: 2,
            ..WalkerConfig::default()
        };
        let mut state = TraversalState {
            tabs_sent: 2,
            ..TraversalState::default()
        };
        assert_eq!(
            check_progress(&state, &config),
            GuardDecision::Block(TerminationReason::MaxSteps)
        );
        state.stuck_count = 3;
        assert_eq!(
            check_progress(&state, &config),
            GuardDecision::Block(TerminationReason::FocusStuck)
        );
    }
}
