use crate::ax::ax_model::{AxRole, AxSnapshot, NodeId};

/// Pre-order iterator over a subtree, driven by an explicit stack so deeply
/// nested widget trees cannot overflow the call stack.
pub struct PreOrder<'a> {
    snapshot: &'a AxSnapshot,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let entry = self.snapshot.get(id);
        self.stack.extend(entry.children.iter().rev().copied());
        Some(id)
    }
}

pub fn walk(snapshot: &AxSnapshot, start: NodeId) -> PreOrder<'_> {
    PreOrder {
        snapshot,
        stack: vec![start],
    }
}

/// Every node of the snapshot, document order.
pub fn walk_all(snapshot: &AxSnapshot) -> PreOrder<'_> {
    PreOrder {
        snapshot,
        stack: snapshot.root().into_iter().collect(),
    }
}

/// Ancestors of `id`, root first, excluding `id` itself.
pub fn ancestors(snapshot: &AxSnapshot, id: NodeId) -> Vec<NodeId> {
    let mut chain = Vec::new();
    let mut cursor = snapshot.get(id).parent;
    while let Some(parent) = cursor {
        chain.push(parent);
        cursor = snapshot.get(parent).parent;
    }
    chain.reverse();
    chain
}

/// The node currently holding focus (first match in document order) together
/// with its ancestor chain.
pub fn find_focused(snapshot: &AxSnapshot) -> Option<(NodeId, Vec<NodeId>)> {
    walk_all(snapshot)
        .find(|id| snapshot.get(*id).focused)
        .map(|id| (id, ancestors(snapshot, id)))
}

pub fn find_by_role(snapshot: &AxSnapshot, role: AxRole) -> Vec<NodeId> {
    walk_all(snapshot)
        .filter(|id| snapshot.get(*id).role == role)
        .collect()
}
