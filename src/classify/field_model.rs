use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ax::ax_model::AxRole;
use crate::ax::normalize::text_fingerprint;
use crate::error::FillError;

// ============================================================================
// Field identity and descriptor
// ============================================================================

/// Identity of a field within one scan: (role, normalized name). Grouped
/// fields use the container's role and label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    pub role: AxRole,
    pub name: String,
}

impl FieldKey {
    pub fn new(role: AxRole, name: &str) -> Self {
        Self {
            role,
            name: name.to_string(),
        }
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.role, self.name)
    }
}

/// A discovered field, as persisted in the fields document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub role: AxRole,
    /// Sorted and deduplicated.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub multi: bool,
}

impl FieldDescriptor {
    pub fn key(&self) -> FieldKey {
        FieldKey::new(self.role, &self.name)
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    /// True when the option set is exactly {"Yes", "No"}.
    pub fn is_yes_no(&self) -> bool {
        self.options.len() == 2
            && self.options.iter().any(|o| o == "Yes")
            && self.options.iter().any(|o| o == "No")
    }
}

// ============================================================================
// Fields document (form-fields-<ms>.yaml)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldsDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl FieldsDocument {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        let fingerprint = Some(fields_fingerprint(&fields));
        Self {
            fingerprint,
            fields,
        }
    }

    pub fn load(path: &Path) -> Result<Self, FillError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FillError::io(format!("reading {}", path.display()), e))?;
        serde_yaml::from_str(&content)
            .map_err(|e| FillError::yaml(format!("parsing {}", path.display()), e))
    }

    pub fn save(&self, path: &Path) -> Result<(), FillError> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| FillError::yaml("serializing fields document", e))?;
        std::fs::write(path, yaml)
            .map_err(|e| FillError::io(format!("writing {}", path.display()), e))
    }
}

/// SHA-1 over one `role|name|opt1,opt2` line per field, in document order.
/// Options are sorted first so two scans of an unchanged page agree.
pub fn fields_fingerprint(fields: &[FieldDescriptor]) -> String {
    let lines = fields
        .iter()
        .map(|f| {
            let mut options = f.options.clone();
            options.sort();
            format!("{}|{}|{}", f.role, f.name, options.join(","))
        })
        .collect::<Vec<_>>()
        .join("\n");
    text_fingerprint(&lines)
}
