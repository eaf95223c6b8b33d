//! Shared helpers used by insert, split, update and delete.

use gistree_store::{Box, Id, NodeId, NodeRecord, Snapshot};

/// Union of the mbbs of a list of children. Empty lists union to the
/// zero box for the tree's dimensionality (only reachable for an empty
/// root).
pub(crate) fn union_of(snapshot: &Snapshot, ids: &[Id]) -> Box {
    let mut iter = ids.iter();
    match iter.next() {
        None => Box::empty(snapshot.dimensionality),
        Some(first) => {
            let mut acc = snapshot.node(first).expect("child entry present").mbb().clone();
            for id in iter {
                acc = acc.union(snapshot.node(id).expect("child entry present").mbb());
            }
            acc
        }
    }
}

/// Overwrite a node's own `parent` pointer, preserving its children/mbb.
/// No-op if `node_id` does not name an internal node.
pub(crate) fn set_own_parent(snapshot: &mut Snapshot, node_id: NodeId, new_parent: Option<NodeId>) {
    if let Some(NodeRecord::Internal { children, mbb, .. }) = snapshot.node(&Id::from(node_id)).cloned() {
        snapshot.put_node(
            Id::from(node_id),
            NodeRecord::Internal { children, parent: new_parent, mbb },
        );
    }
}

/// Overwrite a child's `parent` pointer after it moves to a new internal
/// node (split reparenting). Works for both leaf and internal children.
pub(crate) fn reparent(snapshot: &mut Snapshot, child_id: &Id, new_parent: NodeId) {
    match snapshot.node(child_id).cloned() {
        Some(NodeRecord::Leaf { mbb, .. }) => {
            snapshot.put_node(child_id.clone(), NodeRecord::Leaf { parent: new_parent, mbb });
        }
        Some(NodeRecord::Internal { children, mbb, .. }) => {
            snapshot.put_node(
                child_id.clone(),
                NodeRecord::Internal { children, parent: Some(new_parent), mbb },
            );
        }
        None => {}
    }
}

/// Remove one child from a node's children list, leaving its mbb stale
/// (the caller is expected to recompute it, e.g. via `condense_tree`).
pub(crate) fn remove_child(snapshot: &mut Snapshot, node_id: NodeId, child_id: &Id) {
    if let Some(NodeRecord::Internal { mut children, parent, mbb }) =
        snapshot.node(&Id::from(node_id)).cloned()
    {
        children.retain(|c| c != child_id);
        snapshot.put_node(Id::from(node_id), NodeRecord::Internal { children, parent, mbb });
    }
}

/// Minimum children per non-root internal node: `⌈width/2⌉`.
pub(crate) fn min_children(width: usize) -> usize {
    (width + 1) / 2
}
