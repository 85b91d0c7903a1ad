use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

use crate::ax::ax_model::AxRole;
use crate::ax::normalize::norm_text;
use crate::classify::field_model::FieldKey;
use crate::error::FillError;

// ============================================================================
// Resolved value
// ============================================================================

/// Outcome of value resolution for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(untagged)]
pub enum ResolvedValue {
    #[default]
    Empty,
    Single(String),
    Many(Vec<String>),
}

impl ResolvedValue {
    pub fn single(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            ResolvedValue::Empty
        } else {
            ResolvedValue::Single(s)
        }
    }

    pub fn many(items: Vec<String>) -> Self {
        let items: Vec<String> = items.into_iter().filter(|s| !s.trim().is_empty()).collect();
        if items.is_empty() {
            ResolvedValue::Empty
        } else {
            ResolvedValue::Many(items)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ResolvedValue::Empty)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ResolvedValue::Many(_))
    }

    /// Every item, in order. A single value is a one-item list.
    pub fn items(&self) -> Vec<String> {
        match self {
            ResolvedValue::Empty => vec![],
            ResolvedValue::Single(s) => vec![s.clone()],
            ResolvedValue::Many(v) => v.clone(),
        }
    }

    /// Flat text form: lists are comma-joined.
    pub fn as_text(&self) -> String {
        self.items().join(", ")
    }

    /// Interpret a loosely typed YAML/JSON value. Scalars become `Single`,
    /// sequences of scalars become `Many`, anything else is `Empty`.
    pub fn from_yaml(value: &Value) -> Self {
        match value {
            Value::Sequence(seq) => ResolvedValue::many(seq.iter().filter_map(scalar_text).collect()),
            other => scalar_text(other).map(ResolvedValue::single).unwrap_or_default(),
        }
    }
}

impl<'de> Deserialize<'de> for ResolvedValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(ResolvedValue::from_yaml(&raw))
    }
}

/// Text of a YAML scalar; `None` for null, mappings and sequences.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(norm_text(s)),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(t) => scalar_text(&t.value),
        _ => None,
    }
}

// ============================================================================
// Source profile (resume-like YAML)
// ============================================================================

/// Flat key space built from a profile document.
///
/// Accepts a flat map, values nested under `candidate:`, and an `answers:`
/// list of single-key maps. Top-level keys win over nested ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SourceProfile {
    entries: BTreeMap<String, Value>,
}

impl SourceProfile {
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        let root: Value = serde_yaml::from_str(content)?;
        Ok(Self::from_value(&root))
    }

    pub fn load(path: &Path) -> Result<Self, FillError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FillError::io(format!("reading {}", path.display()), e))?;
        Self::from_yaml_str(&content)
            .map_err(|e| FillError::yaml(format!("parsing {}", path.display()), e))
    }

    pub fn from_value(root: &Value) -> Self {
        let mut entries = BTreeMap::new();
        let Value::Mapping(map) = root else {
            return Self { entries };
        };

        let mut nested: Vec<(String, Value)> = Vec::new();
        for (k, v) in map {
            let Some(key) = k.as_str() else { continue };
            match (key, v) {
                ("candidate", Value::Mapping(inner)) => {
                    nested.extend(
                        inner
                            .iter()
                            .filter_map(|(ik, iv)| ik.as_str().map(|s| (s.to_string(), iv.clone()))),
                    );
                }
                ("answers", Value::Sequence(items)) => {
                    for item in items {
                        if let Value::Mapping(m) = item {
                            nested.extend(
                                m.iter()
                                    .filter_map(|(ik, iv)| ik.as_str().map(|s| (s.to_string(), iv.clone()))),
                            );
                        }
                    }
                }
                _ => {
                    entries.insert(key.to_string(), v.clone());
                }
            }
        }
        for (k, v) in nested {
            entries.entry(k).or_insert(v);
        }

        Self { entries }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// First non-empty scalar among `keys`.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| self.entries.get(*k))
            .filter_map(scalar_text)
            .find(|s| !s.is_empty())
    }

    /// First non-empty list among `keys`. Comma-separated strings are split.
    pub fn list(&self, keys: &[&str]) -> Vec<String> {
        for key in keys {
            let items: Vec<String> = match self.entries.get(*key) {
                Some(Value::Sequence(seq)) => seq.iter().filter_map(scalar_text).collect(),
                Some(other) => scalar_text(other)
                    .map(|s| s.split(',').map(|p| p.trim().to_string()).collect())
                    .unwrap_or_default(),
                None => continue,
            };
            let items: Vec<String> = items.into_iter().filter(|s| !s.is_empty()).collect();
            if !items.is_empty() {
                return items;
            }
        }
        vec![]
    }

    pub fn number(&self, key: &str) -> Option<usize> {
        self.entries
            .get(key)
            .and_then(scalar_text)
            .and_then(|s| s.parse().ok())
    }
}

// ============================================================================
// Prior answers document (llm-answers-<ms>.yaml)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub name: String,
    pub role: AxRole,
    #[serde(default)]
    pub value: ResolvedValue,
}

impl AnswerEntry {
    pub fn key(&self) -> FieldKey {
        FieldKey::new(self.role, &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswersDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub fields: Vec<AnswerEntry>,
}

impl AnswersDocument {
    pub fn load(path: &Path) -> Result<Self, FillError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FillError::io(format!("reading {}", path.display()), e))?;
        serde_yaml::from_str(&content)
            .map_err(|e| FillError::yaml(format!("parsing {}", path.display()), e))
    }

    pub fn save(&self, path: &Path) -> Result<(), FillError> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| FillError::yaml("serializing answers document", e))?;
        std::fs::write(path, yaml)
            .map_err(|e| FillError::io(format!("writing {}", path.display()), e))
    }

    /// Non-empty answer recorded for exactly this (role, name).
    pub fn lookup(&self, key: &FieldKey) -> Option<&ResolvedValue> {
        self.fields
            .iter()
            .find(|e| e.role == key.role && e.name == key.name)
            .map(|e| &e.value)
            .filter(|v| !v.is_empty())
    }
}

/// Everything a resolver may draw values from.
#[derive(Debug, Clone, Default)]
pub struct ValueSource {
    pub answers: Option<AnswersDocument>,
    pub profile: Option<SourceProfile>,
}

impl ValueSource {
    pub fn with_profile(profile: SourceProfile) -> Self {
        Self {
            answers: None,
            profile: Some(profile),
        }
    }
}
