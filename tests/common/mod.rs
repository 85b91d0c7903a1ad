#![allow(dead_code)]

use std::collections::BTreeSet;

use focus_fill::ax::ax_model::{AxNode, AxRole, AxSnapshot};
use focus_fill::browser::surface::{BrowserSurface, Key};
use focus_fill::error::FillError;

// ============================================================================
// Tree builders
// ============================================================================

pub fn node(role: AxRole, name: &str) -> AxNode {
    AxNode::new(role, name)
}

pub fn textbox(name: &str) -> AxNode {
    AxNode::new(AxRole::Textbox, name)
}

pub fn radiogroup(name: &str, options: &[&str]) -> AxNode {
    AxNode::new(AxRole::Radiogroup, name)
        .with_children(options.iter().map(|o| AxNode::new(AxRole::Radio, o)).collect())
}

pub fn combobox(name: &str, options: &[&str]) -> AxNode {
    AxNode::new(AxRole::Combobox, name)
        .with_children(options.iter().map(|o| AxNode::new(AxRole::Option, o)).collect())
}

pub fn listbox(name: &str, options: &[&str]) -> AxNode {
    AxNode::new(AxRole::Listbox, name)
        .with_children(options.iter().map(|o| AxNode::new(AxRole::Option, o)).collect())
}

pub fn checkbox_group(name: &str, boxes: &[&str]) -> AxNode {
    AxNode::new(AxRole::Group, name)
        .with_children(boxes.iter().map(|b| AxNode::new(AxRole::Checkbox, b)).collect())
}

pub fn button(name: &str) -> AxNode {
    AxNode::new(AxRole::Button, name)
}

pub fn page(children: Vec<AxNode>) -> AxNode {
    AxNode::new(AxRole::Other, "Application").with_children(children)
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// FakePage: an in-memory page with a tab order
// ============================================================================

type Path = Vec<usize>;

/// Keyboard-driven page model. Tab stops are every interactive node plus
/// buttons, in document order; a radio group is one stop (its first radio).
pub struct FakePage {
    pub tree: AxNode,
    stops: Vec<Path>,
    stop: Option<usize>,
    focus: Option<Path>,
    combo_open: bool,
    pub checked: BTreeSet<String>,
    pub selected: Vec<String>,
    pub chips: Vec<String>,
    pub body_text: String,
    pub ops: Vec<String>,
    /// Tab leaves focus where it is.
    pub swallow_tab: bool,
    /// Tab fails once this many have been sent.
    pub fail_tab_after: Option<usize>,
    pub fail_clicks: bool,
    pub fail_snapshots: bool,
    pub fail_full_page: bool,
    /// The next N typing bursts into a text field lose their last character.
    pub flaky_typing: usize,
    tabs: usize,
}

impl FakePage {
    pub fn new(tree: AxNode) -> Self {
        let mut stops = Vec::new();
        collect_stops(&tree, &mut vec![], &mut stops);
        Self {
            tree,
            stops,
            stop: None,
            focus: None,
            combo_open: false,
            checked: BTreeSet::new(),
            selected: Vec::new(),
            chips: Vec::new(),
            body_text: String::new(),
            ops: Vec::new(),
            swallow_tab: false,
            fail_tab_after: None,
            fail_clicks: false,
            fail_snapshots: false,
            fail_full_page: false,
            flaky_typing: 0,
            tabs: 0,
        }
    }

    pub fn with_body_text(mut self, text: &str) -> Self {
        self.body_text = text.to_string();
        self
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// Current value of the first node named `name`.
    pub fn value_of(&self, name: &str) -> Option<String> {
        find_named(&self.tree, name).and_then(|n| n.value.clone())
    }

    pub fn focused_name(&self) -> Option<String> {
        self.focus.as_ref().map(|p| self.node_at(p).name.clone())
    }

    pub fn count_ops(&self, op: &str) -> usize {
        self.ops.iter().filter(|o| o.as_str() == op).count()
    }

    /// Put focus on the first stop named `name`.
    pub fn focus_on(&mut self, name: &str) {
        let idx = self
            .stops
            .iter()
            .position(|p| self.node_at(p).name == name)
            .expect("no such stop");
        self.stop = Some(idx);
        self.focus = Some(self.stops[idx].clone());
    }

    fn node_at(&self, path: &[usize]) -> &AxNode {
        path.iter().fold(&self.tree, |n, i| &n.children[*i])
    }

    fn node_at_mut(&mut self, path: &[usize]) -> &mut AxNode {
        path.iter().fold(&mut self.tree, |n, i| &mut n.children[*i])
    }

    fn focused_role(&self) -> Option<AxRole> {
        self.focus.as_ref().map(|p| self.node_at(p).role)
    }

    fn move_focus(&mut self, forward: bool) {
        if self.stops.is_empty() {
            return;
        }
        let len = self.stops.len();
        let next = match (self.stop, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        self.stop = Some(next);
        self.focus = Some(self.stops[next].clone());
        self.combo_open = false;
    }

    fn next_radio(&mut self) {
        let Some(path) = self.focus.clone() else { return };
        let Some((last, parent)) = path.split_last() else { return };
        let siblings: Vec<usize> = self
            .node_at(parent)
            .children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.role == AxRole::Radio)
            .map(|(i, _)| i)
            .collect();
        let pos = siblings.iter().position(|i| i == last).unwrap_or(0);
        let next = siblings[(pos + 1) % siblings.len()];
        let mut new_path = parent.to_vec();
        new_path.push(next);
        self.focus = Some(new_path);
    }

    fn select_option(&mut self, name: &str) -> bool {
        let Some(path) = self.focus.clone() else { return false };
        let role = self.node_at(&path).role;
        let has_option = self
            .node_at(&path)
            .children
            .iter()
            .any(|c| c.role == AxRole::Option && c.name.eq_ignore_ascii_case(name));
        match role {
            AxRole::Combobox if has_option => {
                let canonical = self
                    .node_at(&path)
                    .children
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name))
                    .map(|c| c.name.clone())
                    .unwrap_or_default();
                self.node_at_mut(&path).value = Some(canonical);
                self.combo_open = false;
                true
            }
            AxRole::Listbox if has_option => {
                self.selected.push(name.to_string());
                true
            }
            r if r.is_text_like() => {
                self.chips.push(name.to_string());
                self.node_at_mut(&path).value = None;
                true
            }
            _ => false,
        }
    }
}

fn collect_stops(node: &AxNode, path: &mut Path, out: &mut Vec<Path>) {
    let first_radio = node.children.iter().position(|c| c.role == AxRole::Radio);
    for (i, child) in node.children.iter().enumerate() {
        path.push(i);
        let is_stop = match child.role {
            AxRole::Radio => Some(i) == first_radio,
            AxRole::Button => true,
            r => r.is_interactive() && !child.disabled,
        };
        if is_stop {
            out.push(path.clone());
        }
        // Options of a selector are reached through the selector
        if !child.role.is_selector() {
            collect_stops(child, path, out);
        }
        path.pop();
    }
}

fn find_named<'a>(node: &'a AxNode, name: &str) -> Option<&'a AxNode> {
    if node.name == name {
        return Some(node);
    }
    node.children.iter().find_map(|c| find_named(c, name))
}

impl BrowserSurface for FakePage {
    fn snapshot(&mut self) -> Result<AxSnapshot, FillError> {
        if self.fail_snapshots {
            return Err(FillError::Backend("snapshot unavailable".into()));
        }
        let mut tree = self.tree.clone();
        if let Some(path) = &self.focus {
            let focused = path.iter().fold(&mut tree, |n, i| &mut n.children[*i]);
            focused.focused = true;
        }
        Ok(AxSnapshot::from_tree(&tree))
    }

    fn press_key(&mut self, key: Key) -> Result<(), FillError> {
        self.ops.push(format!("press:{}", key));
        match key {
            Key::Tab => {
                if self.fail_tab_after.is_some_and(|n| self.tabs >= n) {
                    return Err(FillError::SessionIO("page closed".into()));
                }
                self.tabs += 1;
                if !self.swallow_tab {
                    self.move_focus(true);
                }
            }
            Key::ShiftTab => self.move_focus(false),
            Key::Delete => {
                if let Some(path) = self.focus.clone() {
                    if self.node_at(&path).role.is_text_like() {
                        self.node_at_mut(&path).value = None;
                    }
                }
            }
            Key::Enter => {
                if self.focused_role() == Some(AxRole::Combobox) {
                    self.combo_open = true;
                }
            }
            Key::ArrowDown => {
                if self.focused_role() == Some(AxRole::Radio) {
                    self.next_radio();
                }
            }
            Key::Space => {
                if let Some(name) = self.focused_name() {
                    if !self.checked.remove(&name) {
                        self.checked.insert(name);
                    }
                }
            }
            Key::SelectAll => {}
        }
        Ok(())
    }

    fn type_text(&mut self, text: &str, delay_ms: u64) -> Result<(), FillError> {
        self.ops.push(format!("type:{}@{}", text, delay_ms));
        let Some(path) = self.focus.clone() else {
            return Ok(());
        };
        match self.node_at(&path).role {
            r if r.is_text_like() => {
                let mut text = text.to_string();
                if self.flaky_typing > 0 {
                    self.flaky_typing -= 1;
                    text.pop();
                }
                let node = self.node_at_mut(&path);
                let mut current = node.value.take().unwrap_or_default();
                current.push_str(&text);
                node.value = Some(current);
            }
            AxRole::Combobox if self.combo_open => {
                self.select_option(text);
            }
            _ => {}
        }
        Ok(())
    }

    fn click_option(&mut self, name: &str) -> Result<(), FillError> {
        self.ops.push(format!("click:{}", name));
        if self.fail_clicks {
            return Err(FillError::SessionProtocol {
                command: "click_option".into(),
                error: "timeout".into(),
            });
        }
        if self.select_option(name) {
            Ok(())
        } else {
            Err(FillError::unsupported("click_option", format!("no option named {}", name)))
        }
    }

    fn read_page_text(&mut self) -> Result<String, FillError> {
        let mut parts = vec![self.body_text.clone()];
        parts.extend(self.chips.iter().cloned());
        Ok(parts.join("\n"))
    }

    fn screenshot(&mut self, full_page: bool) -> Result<Vec<u8>, FillError> {
        if full_page && self.fail_full_page {
            return Err(FillError::Backend("page too tall".into()));
        }
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}
