use std::collections::{BTreeSet, HashMap, HashSet};

use crate::ax::ax_model::{AxEntry, AxRole, AxSnapshot, NodeId};
use crate::ax::normalize::norm_text;
use crate::ax::tree::{ancestors, find_by_role, walk, walk_all};
use crate::classify::field_model::{FieldDescriptor, FieldKey};
use crate::resolve::examples::guess_example;

/// Nearest semantic grouping of a control.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub id: NodeId,
    pub role: AxRole,
    /// Normalized accessible name of the container, may be empty.
    pub label: String,
}

/// A node can receive a value: interactive role, enabled, writable.
pub fn is_editable(entry: &AxEntry) -> bool {
    entry.role.is_interactive() && !entry.disabled && !entry.readonly
}

fn is_container_role(role: AxRole) -> bool {
    matches!(
        role,
        AxRole::Radiogroup | AxRole::Group | AxRole::Form | AxRole::Listbox | AxRole::Combobox
    )
}

/// Find the container for `id`: itself when it is a combobox/listbox, else the
/// nearest container ancestor, else itself. `ancestors` is root-first.
pub fn nearest_container(snapshot: &AxSnapshot, id: NodeId, ancestors: &[NodeId]) -> Container {
    let entry = snapshot.get(id);
    let container = if entry.role.is_selector() {
        id
    } else {
        ancestors
            .iter()
            .rev()
            .copied()
            .find(|a| is_container_role(snapshot.get(*a).role))
            .unwrap_or(id)
    };

    let c = snapshot.get(container);
    Container {
        id: container,
        role: c.role,
        label: norm_text(&c.name),
    }
}

/// Option names inside a container, deduplicated in document order, plus the
/// role the options imply for the field. Non-grouping containers yield nothing.
pub fn collect_options(snapshot: &AxSnapshot, container: NodeId) -> (Vec<String>, Option<AxRole>) {
    let role = snapshot.get(container).role;
    let targets: &[AxRole] = match role {
        AxRole::Combobox | AxRole::Listbox => &[AxRole::Option],
        AxRole::Radiogroup | AxRole::Group => &[AxRole::Radio, AxRole::Checkbox],
        _ => return (vec![], None),
    };

    let mut seen = HashSet::new();
    let options = walk(snapshot, container)
        .map(|id| snapshot.get(id))
        .filter(|e| targets.contains(&e.role))
        .map(|e| norm_text(&e.name))
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect();

    (options, Some(role))
}

/// Options of a combobox whose popup lives elsewhere in the tree: any listbox
/// carrying the same label.
fn detached_listbox_options(snapshot: &AxSnapshot, label: &str) -> Vec<String> {
    find_by_role(snapshot, AxRole::Listbox)
        .into_iter()
        .filter(|lb| norm_text(&snapshot.get(*lb).name) == label)
        .flat_map(|lb| collect_options(snapshot, lb).0)
        .collect()
}

struct GroupAcc {
    role: AxRole,
    options: BTreeSet<String>,
}

/// Scan the whole tree and return one descriptor per unique (role, name).
///
/// Text fields come first in document order, followed by option groups in the
/// order their label was first met. Groups are flushed after the traversal
/// because later radios/checkboxes of the same group may add options.
pub fn scan_fields(snapshot: &AxSnapshot) -> Vec<FieldDescriptor> {
    let mut fields: Vec<FieldDescriptor> = Vec::new();
    let mut group_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, GroupAcc> = HashMap::new();

    for id in walk_all(snapshot) {
        let entry = snapshot.get(id);
        let name = norm_text(&entry.name);

        if entry.role.is_option_bearing() {
            // Radiogroups and groups label themselves when named
            let container = if matches!(entry.role, AxRole::Radiogroup | AxRole::Group) && !name.is_empty() {
                Container {
                    id,
                    role: entry.role,
                    label: name.clone(),
                }
            } else {
                nearest_container(snapshot, id, &ancestors(snapshot, id))
            };
            let label = if container.label.is_empty() {
                name.clone()
            } else {
                container.label.clone()
            };

            if !label.is_empty() {
                let (mut options, detected) = collect_options(snapshot, container.id);
                let field_role = detected.unwrap_or(entry.role);

                if (field_role == AxRole::Combobox || entry.role == AxRole::Combobox) && options.is_empty() {
                    options.extend(detached_listbox_options(snapshot, &label));
                }

                let acc = groups.entry(label.clone()).or_insert_with(|| {
                    group_order.push(label.clone());
                    GroupAcc {
                        role: field_role,
                        options: BTreeSet::new(),
                    }
                });
                acc.role = field_role;
                acc.options.extend(options);
            }
        } else if entry.role.is_text_like() && !name.is_empty() {
            fields.push(FieldDescriptor {
                example: guess_example(&name, entry.role, &[]),
                name,
                role: entry.role,
                options: vec![],
                multi: false,
            });
        }
    }

    for label in group_order {
        let Some(acc) = groups.remove(&label) else { continue };
        // Layout groups that never showed a choice are not fields
        if matches!(acc.role, AxRole::Group | AxRole::Radiogroup) && acc.options.is_empty() {
            continue;
        }
        let options: Vec<String> = acc.options.into_iter().collect();
        fields.push(FieldDescriptor {
            example: guess_example(&label, acc.role, &options),
            multi: acc.role == AxRole::Listbox,
            name: label,
            role: acc.role,
            options,
        });
    }

    dedupe_fields(fields)
}

/// Keep the first descriptor for each (role, name).
pub fn dedupe_fields(fields: Vec<FieldDescriptor>) -> Vec<FieldDescriptor> {
    let mut seen: HashSet<FieldKey> = HashSet::new();
    fields.into_iter().filter(|f| seen.insert(f.key())).collect()
}
