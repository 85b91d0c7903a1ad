use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// Wire model: one node of the bridge's accessibility snapshot
// ============================================================================

/// Accessibility role as reported by the browser.
///
/// Only the roles the engine reasons about get their own variant; everything
/// else (`WebArea`, `heading`, `link`, `StaticText`, ...) collapses to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxRole {
    Textbox,
    Searchbox,
    Textarea,
    Spinbutton,
    Checkbox,
    Radio,
    Switch,
    Combobox,
    Listbox,
    Radiogroup,
    Group,
    Button,
    Option,
    Form,
    Slider,
    Menuitemcheckbox,
    Menuitemradio,
    #[serde(other)]
    Other,
}

impl AxRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AxRole::Textbox => "textbox",
            AxRole::Searchbox => "searchbox",
            AxRole::Textarea => "textarea",
            AxRole::Spinbutton => "spinbutton",
            AxRole::Checkbox => "checkbox",
            AxRole::Radio => "radio",
            AxRole::Switch => "switch",
            AxRole::Combobox => "combobox",
            AxRole::Listbox => "listbox",
            AxRole::Radiogroup => "radiogroup",
            AxRole::Group => "group",
            AxRole::Button => "button",
            AxRole::Option => "option",
            AxRole::Form => "form",
            AxRole::Slider => "slider",
            AxRole::Menuitemcheckbox => "menuitemcheckbox",
            AxRole::Menuitemradio => "menuitemradio",
            AxRole::Other => "other",
        }
    }

    /// Roles whose value is typed as free text.
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            AxRole::Textbox | AxRole::Searchbox | AxRole::Textarea | AxRole::Spinbutton
        )
    }

    /// Roles that belong to a group of choices and are labelled by a container.
    pub fn is_option_bearing(&self) -> bool {
        matches!(
            self,
            AxRole::Radio
                | AxRole::Checkbox
                | AxRole::Combobox
                | AxRole::Listbox
                | AxRole::Radiogroup
                | AxRole::Group
        )
    }

    /// Roles a user can put a value into (before disabled/readonly checks).
    pub fn is_interactive(&self) -> bool {
        self.is_text_like()
            || matches!(
                self,
                AxRole::Combobox
                    | AxRole::Listbox
                    | AxRole::Checkbox
                    | AxRole::Radio
                    | AxRole::Switch
                    | AxRole::Slider
                    | AxRole::Menuitemcheckbox
                    | AxRole::Menuitemradio
            )
    }

    pub fn is_selector(&self) -> bool {
        matches!(self, AxRole::Combobox | AxRole::Listbox)
    }
}

impl std::fmt::Display for AxRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of the accessibility snapshot as serialized by the bridge
/// (Playwright's `page.accessibility.snapshot()` shape).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AxNode {
    pub role: AxRole,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub value: Option<String>,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub children: Vec<AxNode>,
}

impl AxNode {
    pub fn new(role: AxRole, name: &str) -> Self {
        Self {
            role,
            name: name.to_string(),
            value: None,
            focused: false,
            disabled: false,
            readonly: false,
            children: vec![],
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn with_children(mut self, children: Vec<AxNode>) -> Self {
        self.children = children;
        self
    }
}

/// Spinbuttons and sliders report numeric values; everything downstream compares text.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

// ============================================================================
// Arena: one immutable snapshot, indexed by NodeId
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct AxEntry {
    pub role: AxRole,
    pub name: String,
    pub value: Option<String>,
    pub focused: bool,
    pub disabled: bool,
    pub readonly: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Flattened accessibility tree. Node ids are only meaningful within the
/// snapshot that produced them; take a fresh snapshot after every interaction.
#[derive(Debug, Clone)]
pub struct AxSnapshot {
    nodes: Vec<AxEntry>,
}

impl AxSnapshot {
    /// Flatten a wire tree into the arena (pre-order, root is `NodeId(0)`).
    pub fn from_tree(root: &AxNode) -> Self {
        let mut nodes: Vec<AxEntry> = Vec::new();
        let mut stack: Vec<(&AxNode, Option<NodeId>)> = vec![(root, None)];

        while let Some((node, parent)) = stack.pop() {
            let id = NodeId(nodes.len());
            nodes.push(AxEntry {
                role: node.role,
                name: node.name.clone(),
                value: node.value.clone(),
                focused: node.focused,
                disabled: node.disabled,
                readonly: node.readonly,
                parent,
                children: Vec::with_capacity(node.children.len()),
            });
            if let Some(p) = parent {
                nodes[p.0].children.push(id);
            }
            for child in node.children.iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        Self { nodes }
    }

    /// Parse the bridge's JSON payload. `null` (blank page) yields an empty snapshot.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self { nodes: vec![] });
        }
        let root: AxNode = serde_json::from_value(value)?;
        Ok(Self::from_tree(&root))
    }

    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() { None } else { Some(NodeId(0)) }
    }

    pub fn get(&self, id: NodeId) -> &AxEntry {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
