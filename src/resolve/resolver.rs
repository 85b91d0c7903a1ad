use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::ax::ax_model::AxRole;
use crate::classify::field_model::{FieldDescriptor, FieldKey};
use crate::resolve::matcher::{MatchFallback, best_option, match_option};
use crate::resolve::rules::{RuleInput, ValueRule, default_rules, yes_no_from_status};
use crate::resolve::source::{ResolvedValue, ValueSource};

/// Roles tried, in order, when the focused control has no plan of its own and
/// its container label is known.
pub const CONTAINER_ROLES: [AxRole; 4] = [
    AxRole::Listbox,
    AxRole::Combobox,
    AxRole::Radiogroup,
    AxRole::Group,
];

/// Value resolution: prior answer > heuristic rule > scanned example > empty.
pub struct ValueResolver {
    rules: Vec<Box<dyn ValueRule>>,
    top_n: usize,
}

impl ValueResolver {
    pub fn new(top_n: usize) -> Self {
        Self::with_rules(default_rules(), top_n)
    }

    pub fn with_rules(rules: Vec<Box<dyn ValueRule>>, top_n: usize) -> Self {
        Self {
            rules,
            top_n: top_n.max(1),
        }
    }

    pub fn resolve(&self, field: &FieldDescriptor, source: &ValueSource) -> ResolvedValue {
        if let Some(answer) = source.answers.as_ref().and_then(|a| a.lookup(&field.key())) {
            debug!(field = %field.key(), "value from prior answers");
            return self.reconcile(field, answer.clone());
        }

        if let Some(profile) = &source.profile {
            let input = RuleInput::new(field, profile, self.top_n);
            for rule in &self.rules {
                let Some(value) = rule.answer(&input) else {
                    continue;
                };
                // An answer no option resembles is no opinion for a closed field
                match self.map_options(field, value, None) {
                    Some(value) => {
                        debug!(field = %field.key(), rule = rule.name(), "value from rule");
                        return value;
                    }
                    None => debug!(field = %field.key(), rule = rule.name(), "rule answer matches no option"),
                }
            }
            if field.is_yes_no() {
                if let Some(value) = yes_no_from_status(profile) {
                    debug!(field = %field.key(), "yes/no from status");
                    return value;
                }
            }
        }

        self.reconcile(field, ResolvedValue::single(field.example.clone()))
    }

    /// Map an answer onto the field's options. Text fields keep the answer;
    /// single selectors get one option; multi selectors get at most `top_n`
    /// distinct options.
    pub fn reconcile(&self, field: &FieldDescriptor, value: ResolvedValue) -> ResolvedValue {
        self.map_options(field, value, Some(MatchFallback::FirstOption))
            .unwrap_or_default()
    }

    /// Without a fallback, items no option resembles are dropped and `None`
    /// is returned when nothing is left.
    fn map_options(
        &self,
        field: &FieldDescriptor,
        value: ResolvedValue,
        fallback: Option<MatchFallback>,
    ) -> Option<ResolvedValue> {
        if value.is_empty() || !field.has_options() {
            return Some(value);
        }

        let items: Vec<String> = match &value {
            ResolvedValue::Single(s) if field.multi => split_items(s),
            other => other.items(),
        };

        let mut seen = BTreeSet::new();
        let matched: Vec<String> = items
            .iter()
            .filter_map(|item| match fallback {
                Some(fallback) => Some(best_option(item, &field.options, fallback)),
                None => match_option(item, &field.options),
            })
            .filter(|o| seen.insert(o.clone()))
            .collect();

        if matched.is_empty() {
            return None;
        }
        if field.multi {
            Some(ResolvedValue::many(matched.into_iter().take(self.top_n).collect()))
        } else {
            matched.into_iter().next().map(ResolvedValue::single)
        }
    }
}

/// Split a free-text list on `,` and `;`.
pub fn split_items(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Values for every scanned field, looked up by the walker as focus moves.
#[derive(Debug, Clone, Default)]
pub struct FieldPlan {
    values: HashMap<FieldKey, ResolvedValue>,
    options: HashMap<String, Vec<String>>,
    multi_options: Vec<String>,
}

impl FieldPlan {
    pub fn build(fields: &[FieldDescriptor], source: &ValueSource, resolver: &ValueResolver) -> Self {
        let mut plan = FieldPlan::default();
        let mut multi = BTreeSet::new();

        for field in fields {
            let value = resolver.resolve(field, source);
            plan.values.entry(field.key()).or_insert(value);
            if field.has_options() {
                plan.options
                    .entry(field.name.clone())
                    .or_default()
                    .extend(field.options.iter().cloned());
                if field.multi {
                    multi.extend(field.options.iter().cloned());
                }
            }
        }
        plan.multi_options = multi.into_iter().collect();
        plan
    }

    pub fn insert(&mut self, key: FieldKey, value: ResolvedValue) {
        self.values.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value for the focused control: its own key first, then the container
    /// label under each grouping role.
    pub fn value_for(&self, key: &FieldKey, container_label: Option<&str>) -> ResolvedValue {
        if let Some(v) = self.values.get(key).filter(|v| !v.is_empty()) {
            return v.clone();
        }
        let Some(label) = container_label.filter(|l| !l.is_empty()) else {
            return ResolvedValue::Empty;
        };
        CONTAINER_ROLES
            .iter()
            .filter_map(|role| self.values.get(&FieldKey::new(*role, label)))
            .find(|v| !v.is_empty())
            .cloned()
            .unwrap_or_default()
    }

    /// Options a chip token should be mapped onto: those of a selector sharing
    /// the label, else every multi-select option of the form.
    pub fn chip_options(&self, label: &str) -> &[String] {
        match self.options.get(label) {
            Some(opts) if !opts.is_empty() => opts,
            _ => &self.multi_options,
        }
    }
}
