use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::ax::ax_model::{AxRole, AxSnapshot};
use crate::ax::normalize::{norm_text, stable_label};
use crate::ax::tree::find_focused;
use crate::browser::surface::BrowserSurface;
use crate::classify::classifier::{Container, is_editable, nearest_container};
use crate::classify::field_model::FieldKey;
use crate::fill::executor::{FillTarget, fill_field};
use crate::fill::pacing::{Pacer, Pause};
use crate::resolve::resolver::FieldPlan;
use crate::trace::event::EventLog;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;
use crate::walker::guard::{GuardDecision, check_loop, check_progress};
use crate::walker::walker_model::{
    FocusStep, TerminationReason, TraversalState, UNLABELED_FIELD, WalkerConfig, WalkerState,
};

/// Result of one walk. Always produced, whatever ended the run.
#[derive(Debug, Clone)]
pub struct WalkOutcome {
    pub traversal: TraversalState,
    pub termination: TerminationReason,
    pub events: EventLog,
    /// Buttons that share a container with the field focused just before them.
    pub buttons: BTreeMap<String, BTreeSet<String>>,
}

/// Read the focused node of a snapshot and derive its identity and labels.
pub fn observe_focus(snapshot: &AxSnapshot) -> Option<FocusStep> {
    let (id, ancestors) = find_focused(snapshot)?;
    let entry = snapshot.get(id);
    let name = norm_text(&entry.name);

    let container = nearest_container(snapshot, id, &ancestors);
    // Text inputs are labelled by their own name, never by an enclosing form
    let container_label = if entry.role.is_text_like() {
        String::new()
    } else {
        container.label.clone()
    };

    let raw = if !container_label.is_empty() {
        container_label.as_str()
    } else if !name.is_empty() {
        name.as_str()
    } else {
        UNLABELED_FIELD
    };

    let identity = if container.id != id && !container_label.is_empty() {
        FieldKey::new(entry.role, &format!("{}|{}", container_label, name))
    } else {
        FieldKey::new(entry.role, &name)
    };

    Some(FocusStep {
        key: FieldKey::new(entry.role, &name),
        identity,
        role: entry.role,
        stable_label: stable_label(raw, entry.value.as_deref()),
        editable: is_editable(entry),
        name,
        container,
        container_label,
    })
}

/// Tab-order traversal that fills every new field it lands on.
pub struct FocusWalker<'a, S: BrowserSurface + ?Sized> {
    surface: &'a mut S,
    plan: &'a FieldPlan,
    config: &'a WalkerConfig,
    pacer: &'a mut dyn Pacer,
    tracer: &'a TraceLogger,
    state: WalkerState,
    traversal: TraversalState,
    events: EventLog,
    buttons: BTreeMap<String, BTreeSet<String>>,
}

impl<'a, S: BrowserSurface + ?Sized> FocusWalker<'a, S> {
    pub fn new(
        surface: &'a mut S,
        plan: &'a FieldPlan,
        config: &'a WalkerConfig,
        pacer: &'a mut dyn Pacer,
        tracer: &'a TraceLogger,
    ) -> Self {
        Self {
            surface,
            plan,
            config,
            pacer,
            tracer,
            state: WalkerState::Scanning,
            traversal: TraversalState::default(),
            events: EventLog::new(),
            buttons: BTreeMap::new(),
        }
    }

    pub fn run(mut self) -> WalkOutcome {
        // Nudge focus into the document; not counted
        if let Err(e) = self.surface.advance_focus() {
            warn!(error = %e, "initial focus nudge failed");
        }
        self.pacer.pause(Pause::Step);

        let mut step: u32 = 0;
        let termination = loop {
            if let GuardDecision::Block(reason) = check_progress(&self.traversal, self.config) {
                break reason;
            }

            let observed = match self.surface.snapshot() {
                Ok(snapshot) => observe_focus(&snapshot),
                Err(e) => {
                    warn!(step, error = %e, "snapshot failed, treating as no focus");
                    None
                }
            };

            let mut trace = TraceEvent::now(step, &self.state);
            if let Some(obs) = &observed {
                trace = trace.with_focused(&obs.key).with_label(&obs.stable_label);
            }

            let action = match &observed {
                Some(obs) if obs.editable => {
                    self.state = WalkerState::AtField;
                    match self.visit_field(obs) {
                        Ok(action) => action,
                        Err(reason) => {
                            self.tracer.log(&trace.with_action("loop_backtrack"));
                            break reason;
                        }
                    }
                }
                Some(obs) if obs.role == AxRole::Button => {
                    self.state = WalkerState::AtContainerOnly;
                    self.note_button(obs)
                }
                _ => {
                    self.state = WalkerState::AtContainerOnly;
                    "none"
                }
            };

            self.state = WalkerState::Advancing;
            if let Err(e) = self.surface.advance_focus() {
                warn!(step, error = %e, "focus advance failed");
                self.tracer.log(&trace.with_action("advance_failed"));
                break TerminationReason::AdvanceFailed;
            }
            self.traversal.tabs_sent += 1;
            self.pacer.pause(Pause::Step);

            self.tracer
                .log(&trace.with_action(action).with_events(self.events.len()));

            self.traversal.note_key(observed.as_ref().map(|o| &o.identity));
            step += 1;
        };

        self.state = WalkerState::Done(termination);
        self.traversal.termination = Some(termination);
        info!(
            reason = %termination,
            tabs = self.traversal.tabs_sent,
            fields = self.traversal.recorded_labels.len(),
            events = self.events.len(),
            "walk finished"
        );

        WalkOutcome {
            traversal: self.traversal,
            termination,
            events: self.events,
            buttons: self.buttons,
        }
    }

    /// Handle an editable stop. `Err` ends the walk.
    fn visit_field(&mut self, obs: &FocusStep) -> Result<&'static str, TerminationReason> {
        let label = obs.stable_label.as_str();
        self.traversal.note_label(label);

        if let GuardDecision::Block(reason) = check_loop(&self.traversal, label, self.config) {
            info!(label, "focus order wrapped around, stepping back once");
            if let Err(e) = self.surface.reverse_focus() {
                warn!(error = %e, "reverse focus failed");
            }
            self.pacer.pause(Pause::Key);
            self.traversal.backtracked = true;
            return Err(reason);
        }

        if !self.traversal.visited_keys.insert(obs.identity.clone()) {
            debug!(key = %obs.identity, "already visited");
            return Ok("skip_visited");
        }

        self.traversal.record_label(label);
        let container_label = if obs.container_label.is_empty() {
            label.to_string()
        } else {
            obs.container_label.clone()
        };
        self.traversal.last_container_label = Some(container_label.clone());

        let value = self.plan.value_for(&obs.key, Some(&container_label));
        let target = FillTarget {
            role: obs.role,
            label,
            node_name: &obs.name,
            chip_options: self.plan.chip_options(&container_label),
        };
        let records = fill_field(&mut *self.surface, &mut *self.pacer, &self.config.fill, &target, &value);
        info!(field = label, role = %obs.role, events = records.len(), "filled field");
        self.events.extend(records);

        Ok("fill")
    }

    fn note_button(&mut self, obs: &FocusStep) -> &'static str {
        let Container { label, .. } = &obs.container;
        let same_container = !label.is_empty()
            && !obs.name.is_empty()
            && self.traversal.last_container_label.as_deref() == Some(label.as_str());

        if same_container {
            self.buttons
                .entry(label.clone())
                .or_default()
                .insert(obs.name.clone());
            return "button";
        }
        "none"
    }
}
