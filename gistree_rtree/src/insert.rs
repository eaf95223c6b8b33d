//! Insert (§4.3): ChooseLeaf, AddChildAndMaybeSplit, AdjustTree, grow a
//! new root when the old one splits.

use crate::choose_leaf::choose_leaf;
use crate::split::split_children;
use crate::support::{reparent, set_own_parent, union_of};
use gistree_store::{Box as Mbb, Id, NodeId, NodeRecord, Snapshot};

/// Insert `id` with bounding box `bbox` into the tree. Returns an error
/// if `id` already names an entry (callers should `delete` first if a
/// replace is intended — see §4.5 `update`, which does exactly that).
pub fn insert(snapshot: &mut Snapshot, id: Id, bbox: Mbb) -> Result<(), crate::Error> {
    if snapshot.node(&id).is_some() {
        return Err(crate::Error::Duplicate(id));
    }
    let leaf_parent = choose_leaf(snapshot, &bbox);
    snapshot.put_node(id.clone(), NodeRecord::Leaf { parent: leaf_parent, mbb: bbox });
    add_child_and_maybe_split(snapshot, leaf_parent, id);
    Ok(())
}

/// Insert many entries in sequence. §4.3 leaves bulk insert as repeated
/// single inserts; no bulk-specific fast path is defined.
pub fn bulk_insert(snapshot: &mut Snapshot, entries: Vec<(Id, Mbb)>) -> Result<(), crate::Error> {
    for (id, bbox) in entries {
        insert(snapshot, id, bbox)?;
    }
    Ok(())
}

/// Append `child` to `node_id`'s children list, splitting and propagating
/// upward if it now exceeds `width`, then refreshing every ancestor's mbb.
fn add_child_and_maybe_split(snapshot: &mut Snapshot, node_id: NodeId, child: Id) {
    let (mut children, parent) = match snapshot.node(&Id::from(node_id)) {
        Some(NodeRecord::Internal { children, parent, .. }) => (children.clone(), *parent),
        _ => unreachable!("add_child_and_maybe_split targets an internal node"),
    };
    children.push(child);

    if children.len() <= snapshot.width {
        let mbb = union_of(snapshot, &children);
        snapshot.put_node(Id::from(node_id), NodeRecord::Internal { children, parent, mbb });
        refresh_ancestors_mbb(snapshot, parent);
        return;
    }

    let width = snapshot.width;
    let (group_a, group_b) = split_children(snapshot, &children, width);

    let mbb_a = union_of(snapshot, &group_a);
    snapshot.put_node(
        Id::from(node_id),
        NodeRecord::Internal { children: group_a.clone(), parent, mbb: mbb_a },
    );
    for c in &group_a {
        reparent(snapshot, c, node_id);
    }

    let new_id = snapshot.fresh_id();
    let mbb_b = union_of(snapshot, &group_b);
    snapshot.put_node(
        Id::from(new_id),
        NodeRecord::Internal { children: group_b.clone(), parent, mbb: mbb_b },
    );
    for c in &group_b {
        reparent(snapshot, c, new_id);
    }

    match parent {
        Some(p) => add_child_and_maybe_split(snapshot, p, Id::from(new_id)),
        None => create_new_root(snapshot, node_id, new_id),
    }
}

/// Grow the tree by one level: both `left` and `right` become children of
/// a freshly generated root.
fn create_new_root(snapshot: &mut Snapshot, left: NodeId, right: NodeId) {
    let new_root = snapshot.fresh_id();
    let children = vec![Id::from(left), Id::from(right)];
    let mbb = union_of(snapshot, &children);
    snapshot.put_node(Id::from(new_root), NodeRecord::Internal { children, parent: None, mbb });
    set_own_parent(snapshot, left, Some(new_root));
    set_own_parent(snapshot, right, Some(new_root));
    snapshot.replace_root(new_root);
}

/// Recompute and store `mbb` for `node_id` and every ancestor above it, up
/// to the root. Unlike `update`'s early-stop variant, insert always walks
/// the full path since a split changes membership, not just a box.
pub(crate) fn refresh_ancestors_mbb(snapshot: &mut Snapshot, mut node_id: Option<NodeId>) {
    while let Some(id) = node_id {
        let (children, parent) = match snapshot.node(&Id::from(id)) {
            Some(NodeRecord::Internal { children, parent, .. }) => (children.clone(), *parent),
            _ => return,
        };
        let mbb = union_of(snapshot, &children);
        snapshot.put_node(Id::from(id), NodeRecord::Internal { children, parent, mbb });
        node_id = parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gistree_store::UserKey;

    fn bbox(min: f64, max: f64) -> Mbb {
        Mbb::new(vec![(min, max)]).unwrap()
    }

    #[test]
    fn insert_into_empty_tree_attaches_to_root() {
        let mut snap = Snapshot::empty(4, 1, 7);
        let root = snap.root();
        insert(&mut snap, Id::User(UserKey::Integer(1)), bbox(0.0, 1.0)).unwrap();
        match snap.node(&Id::from(root)).unwrap() {
            NodeRecord::Internal { children, .. } => assert_eq!(children.len(), 1),
            NodeRecord::Leaf { .. } => panic!(),
        }
    }

    #[test]
    fn insert_duplicate_id_is_rejected() {
        let mut snap = Snapshot::empty(4, 1, 7);
        let id = Id::User(UserKey::Integer(1));
        insert(&mut snap, id.clone(), bbox(0.0, 1.0)).unwrap();
        assert!(matches!(insert(&mut snap, id, bbox(1.0, 2.0)), Err(crate::Error::Duplicate(_))));
    }

    #[test]
    fn overfull_node_splits_and_grows_root() {
        let mut snap = Snapshot::empty(2, 1, 3);
        for i in 0..5 {
            insert(&mut snap, Id::User(UserKey::Integer(i)), bbox(i as f64, i as f64 + 1.0)).unwrap();
        }
        let root = snap.root();
        match snap.node(&Id::from(root)).unwrap() {
            NodeRecord::Internal { children, .. } => assert!(children.len() <= 2),
            NodeRecord::Leaf { .. } => panic!(),
        }
        assert_eq!(snap.iter_nodes().filter(|(_, n)| matches!(n, NodeRecord::Leaf { .. })).count(), 5);
    }

    #[test]
    fn root_mbb_covers_every_leaf_after_inserts() {
        let mut snap = Snapshot::empty(3, 1, 11);
        for i in 0..8 {
            insert(&mut snap, Id::User(UserKey::Integer(i)), bbox(i as f64, i as f64 + 1.0)).unwrap();
        }
        let root = snap.root();
        let root_mbb = snap.node(&Id::from(root)).unwrap().mbb().clone();
        for (id, record) in snap.iter_nodes() {
            if let NodeRecord::Leaf { mbb, .. } = record {
                assert_eq!(root_mbb.enlargement(mbb), 0.0, "{id} not covered");
            }
        }
    }
}
