use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::{debug, info};

use crate::classify::field_model::{FieldDescriptor, FieldsDocument};
use crate::error::FillError;
use crate::resolve::matcher::{MatchFallback, best_option};
use crate::resolve::resolver::ValueResolver;
use crate::resolve::source::{
    AnswerEntry, AnswersDocument, ResolvedValue, SourceProfile, ValueSource, scalar_text,
};

pub const SYSTEM_INSTRUCTIONS: &str = r#"You fill job application form fields based on:
- a machine-readable schema of fields with roles and options (from the accessibility tree)
- a candidate profile YAML
- optional prior answers YAML

Return STRICT YAML only, no prose, with this shape:

fields:
  - name: <exact field label from schema>
    role: <same role from schema>
    value: <single-line string, or exact option, or list of exact options>

Rules:
- Only use options that are EXACTLY present in the schema for option fields
- For multi-select fields (listbox, multi: true) return a YAML list of options
- Keep values single-line
- Every item MUST have: name, role, value. No extra keys.
- If a field is not relevant, pick the safest allowed option (e.g. 'Decline To Self Identify', 'I do not want to answer', 'No').
- For work authorization, visa, sponsorship, work permit or eligibility questions, infer the answer from the profile and prior answers. Do not assume defaults.
- Never include instructions to submit the form."#;

/// Something that turns a (system, user) prompt pair into a completion.
pub trait AnswerBackend {
    fn model_name(&self) -> &str;
    fn complete(&self, system: &str, user: &str) -> Result<String, FillError>;
}

// ============================================================================
// Ollama Backend
// ============================================================================

pub struct OllamaBackend {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/generate".to_string(),
            model: "qwen2.5:1.5b".to_string(),
            timeout: Duration::from_secs(90),
        }
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaBackend {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            ..Self::default()
        }
    }
}

impl AnswerBackend for OllamaBackend {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn complete(&self, system: &str, user: &str) -> Result<String, FillError> {
        let request = OllamaRequest {
            model: &self.model,
            system,
            prompt: user,
            stream: false,
            format: "json",
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let response = client.post(&self.endpoint).json(&request).send()?;

        if !response.status().is_success() {
            return Err(FillError::Backend(format!(
                "{} answered {}",
                self.endpoint,
                response.status()
            )));
        }

        let body: OllamaResponse = response.json()?;
        Ok(body.response)
    }
}

// ============================================================================
// Mock Backend (for testing without Ollama)
// ============================================================================

/// Answers with what the deterministic resolver would pick.
pub struct MockAnswerBackend {
    reply: String,
}

impl MockAnswerBackend {
    pub fn deterministic(fields: &[FieldDescriptor], source: &ValueSource, top_n: usize) -> Result<Self, FillError> {
        let resolver = ValueResolver::new(top_n);
        let doc = AnswersDocument {
            model: None,
            fields: fields
                .iter()
                .map(|f| AnswerEntry {
                    name: f.name.clone(),
                    role: f.role,
                    value: resolver.resolve(f, source),
                })
                .collect(),
        };
        let reply =
            serde_yaml::to_string(&doc).map_err(|e| FillError::yaml("serializing mock answers", e))?;
        Ok(Self { reply })
    }

    pub fn canned(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

impl AnswerBackend for MockAnswerBackend {
    fn model_name(&self) -> &str {
        "mock"
    }

    fn complete(&self, _system: &str, _user: &str) -> Result<String, FillError> {
        Ok(self.reply.clone())
    }
}

// ============================================================================
// Prompt and reply handling
// ============================================================================

pub fn build_user_prompt(
    fields: &FieldsDocument,
    profile: &SourceProfile,
    prior: Option<&AnswersDocument>,
) -> Result<String, FillError> {
    let fields_yaml =
        serde_yaml::to_string(fields).map_err(|e| FillError::yaml("serializing fields schema", e))?;
    let profile_yaml =
        serde_yaml::to_string(profile).map_err(|e| FillError::yaml("serializing profile", e))?;
    let prior_yaml = match prior {
        Some(doc) => serde_yaml::to_string(doc).map_err(|e| FillError::yaml("serializing prior answers", e))?,
        None => "{}\n".to_string(),
    };

    Ok(format!(
        r#"You will be given three YAML documents:

1) fields_schema:
{}
2) candidate_profile:
{}
3) prior_answers (optional):
{}
Using these, produce the STRICT YAML as specified. The 'name' must match the schema exactly.
For option fields, 'value' must be one of the provided options, exactly. If a field allows multiple selections (role listbox, text 'Select one or more', or multi: true), return a YAML list of options."#,
        fields_yaml, profile_yaml, prior_yaml
    ))
}

/// Parse a completion as YAML (JSON is accepted too), tolerating code fences.
pub fn parse_reply(reply: &str) -> Result<Value, FillError> {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```yaml")
        .or_else(|| trimmed.strip_prefix("```json"))
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed);
    serde_yaml::from_str(body).map_err(|e| FillError::yaml("parsing model reply", e))
}

/// Keep only schema fields, force the schema role, and map option values
/// onto the schema's options. Free text collapses to a single line.
pub fn normalize_answers(schema: &[FieldDescriptor], reply: &Value) -> Vec<AnswerEntry> {
    let mut by_name: HashMap<&str, &FieldDescriptor> = HashMap::new();
    for field in schema {
        by_name.entry(field.name.as_str()).or_insert(field);
    }

    let Some(items) = reply.get("fields").and_then(Value::as_sequence) else {
        return vec![];
    };

    let mut out = Vec::new();
    for item in items {
        let Some(name) = item.get("name").and_then(Value::as_str) else { continue };
        let Some(field) = by_name.get(name) else {
            debug!(name, "dropping answer for unknown field");
            continue;
        };
        let raw = item.get("value").unwrap_or(&Value::Null);

        let value = if field.has_options() {
            normalize_option_value(raw, &field.options)
        } else {
            ResolvedValue::from_yaml(raw)
        };

        out.push(AnswerEntry {
            name: field.name.clone(),
            role: field.role,
            value,
        });
    }
    out
}

fn normalize_option_value(raw: &Value, options: &[String]) -> ResolvedValue {
    match raw {
        Value::Sequence(seq) => {
            let mut chosen: Vec<String> = Vec::new();
            for token in seq.iter().filter_map(scalar_text).filter(|t| !t.is_empty()) {
                let pick = best_option(&token, options, MatchFallback::FirstOption);
                if !chosen.contains(&pick) {
                    chosen.push(pick);
                }
            }
            ResolvedValue::many(chosen)
        }
        other => match scalar_text(other).filter(|t| !t.is_empty()) {
            Some(token) => ResolvedValue::single(best_option(&token, options, MatchFallback::FirstOption)),
            None => ResolvedValue::Empty,
        },
    }
}

/// Ask the backend for answers to every field and normalize the reply.
pub fn generate_answers(
    backend: &dyn AnswerBackend,
    fields: &FieldsDocument,
    profile: &SourceProfile,
    prior: Option<&AnswersDocument>,
) -> Result<AnswersDocument, FillError> {
    let user = build_user_prompt(fields, profile, prior)?;
    info!(model = backend.model_name(), fields = fields.fields.len(), "requesting answers");

    let reply = backend.complete(SYSTEM_INSTRUCTIONS, &user)?;
    let parsed = parse_reply(&reply)?;
    let answers = normalize_answers(&fields.fields, &parsed);
    info!(answered = answers.len(), "answers normalized");

    Ok(AnswersDocument {
        model: Some(backend.model_name().to_string()),
        fields: answers,
    })
}
