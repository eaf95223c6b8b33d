//! Delete (§4.6): remove a leaf, condense the tree by dissolving any
//! node that underflows below `min_children`, reinsert its surviving
//! entries, and collapse the root's height if it now has a single
//! internal child.

use crate::insert::insert;
use crate::support::{min_children, remove_child, union_of};
use gistree_store::{Box as Mbb, Id, NodeId, NodeRecord, Snapshot};

/// Remove `id` from the tree. A no-op success if `id` is already absent
/// (delete is idempotent); errors only if `id` names an internal node.
pub fn delete(snapshot: &mut Snapshot, id: &Id) -> Result<(), crate::Error> {
    let parent = match snapshot.node(id) {
        Some(NodeRecord::Leaf { parent, .. }) => *parent,
        None => return Ok(()),
        Some(NodeRecord::Internal { .. }) => return Err(crate::Error::UnknownId(id.clone())),
    };
    remove_child(snapshot, parent, id);
    snapshot.remove_node(id);

    let orphans = condense_tree(snapshot, parent);
    collapse_root_if_single_internal_child(snapshot);

    for (orphan_id, orphan_mbb) in orphans {
        insert(snapshot, orphan_id, orphan_mbb).expect("orphan id was already absent from the tree");
    }
    Ok(())
}

/// Delete many entries in sequence.
pub fn bulk_delete(snapshot: &mut Snapshot, ids: &[Id]) -> Result<(), crate::Error> {
    for id in ids {
        delete(snapshot, id)?;
    }
    Ok(())
}

/// Walk from `start` up to the root. Any non-root node that has fallen
/// below `min_children` is detached from its parent and dissolved; its
/// leaf descendants are returned for reinsertion. Every surviving node's
/// mbb is refreshed along the way, all the way to the root — condense
/// cannot early-stop the way `update` does, since the root-collapse
/// decision depends on the final shape of the whole path.
fn condense_tree(snapshot: &mut Snapshot, start: NodeId) -> Vec<(Id, Mbb)> {
    let root = snapshot.root();
    let mut orphans = Vec::new();
    let mut node_id = Some(start);
    let min = min_children(snapshot.width);

    while let Some(id) = node_id {
        let (children, parent) = match snapshot.node(&Id::from(id)) {
            Some(NodeRecord::Internal { children, parent, .. }) => (children.clone(), *parent),
            _ => return orphans,
        };

        if id != root && children.len() < min {
            if let Some(p) = parent {
                remove_child(snapshot, p, &Id::from(id));
            }
            orphans.extend(collect_and_remove_subtree(snapshot, id));
            node_id = parent;
        } else {
            let mbb = union_of(snapshot, &children);
            snapshot.put_node(Id::from(id), NodeRecord::Internal { children, parent, mbb });
            node_id = parent;
        }
    }
    orphans
}

/// Remove `node_id` and every descendant from the snapshot, returning
/// the leaf entries found so the caller can reinsert them.
fn collect_and_remove_subtree(snapshot: &mut Snapshot, node_id: NodeId) -> Vec<(Id, Mbb)> {
    let mut leaves = Vec::new();
    let children = match snapshot.node(&Id::from(node_id)) {
        Some(NodeRecord::Internal { children, .. }) => children.clone(),
        _ => Vec::new(),
    };
    snapshot.remove_node(&Id::from(node_id));

    for child in children {
        match snapshot.node(&child).cloned() {
            Some(NodeRecord::Leaf { mbb, .. }) => {
                snapshot.remove_node(&child);
                leaves.push((child, mbb));
            }
            Some(NodeRecord::Internal { .. }) => {
                let child_node_id = NodeId::try_from(&child).expect("internal child is generated");
                leaves.extend(collect_and_remove_subtree(snapshot, child_node_id));
            }
            None => {}
        }
    }
    leaves
}

/// If the root has exactly one child and that child is itself internal,
/// promote the child to be the new root (§3 invariant 5: a root with a
/// single leaf child is already minimal height and is left alone).
fn collapse_root_if_single_internal_child(snapshot: &mut Snapshot) {
    loop {
        let root = snapshot.root();
        let children = match snapshot.node(&Id::from(root)) {
            Some(NodeRecord::Internal { children, .. }) => children.clone(),
            _ => return,
        };
        if children.len() != 1 {
            return;
        }
        let only = &children[0];
        let Ok(only_node_id) = NodeId::try_from(only) else { return };
        if !matches!(snapshot.node(only), Some(NodeRecord::Internal { .. })) {
            return;
        }
        snapshot.remove_node(&Id::from(root));
        crate::support::set_own_parent(snapshot, only_node_id, None);
        snapshot.replace_root(only_node_id);
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
    fn delete_absent_id_is_idempotent_success() {
        let mut snap = Snapshot::empty(4, 1, 1);
        let res = delete(&mut snap, &Id::User(UserKey::Integer(1)));
        assert!(res.is_ok());
    }

    #[test]
    fn delete_of_internal_node_id_errors() {
        let mut snap = Snapshot::empty(4, 1, 1);
        let root = snap.root();
        let res = delete(&mut snap, &Id::from(root));
        assert!(matches!(res, Err(crate::Error::UnknownId(_))));
    }

    #[test]
    fn insert_then_delete_restores_empty_tree() {
        let mut snap = Snapshot::empty(4, 1, 5);
        let id = Id::User(UserKey::Integer(1));
        insert(&mut snap, id.clone(), bbox(0.0, 1.0)).unwrap();
        delete(&mut snap, &id).unwrap();
        let root = snap.root();
        match snap.node(&Id::from(root)).unwrap() {
            NodeRecord::Internal { children, .. } => assert!(children.is_empty()),
            NodeRecord::Leaf { .. } => panic!(),
        }
    }

    #[test]
    fn insert_many_then_delete_all_restores_key_set() {
        let mut snap = Snapshot::empty(2, 1, 9);
        let ids: Vec<Id> = (0..10i64).map(|i| Id::User(UserKey::Integer(i))).collect();
        for (i, id) in ids.iter().enumerate() {
            insert(&mut snap, id.clone(), bbox(i as f64, i as f64 + 1.0)).unwrap();
        }
        for id in &ids {
            delete(&mut snap, id).unwrap();
        }
        assert_eq!(snap.iter_nodes().filter(|(_, n)| matches!(n, NodeRecord::Leaf { .. })).count(), 0);
        let root = snap.root();
        match snap.node(&Id::from(root)).unwrap() {
            NodeRecord::Internal { children, .. } => assert!(children.is_empty()),
            NodeRecord::Leaf { .. } => panic!(),
        }
    }

    #[test]
    fn deleting_one_of_many_keeps_the_rest_reachable() {
        let mut snap = Snapshot::empty(2, 1, 21);
        let ids: Vec<Id> = (0..6i64).map(|i| Id::User(UserKey::Integer(i))).collect();
        for (i, id) in ids.iter().enumerate() {
            insert(&mut snap, id.clone(), bbox(i as f64, i as f64 + 1.0)).unwrap();
        }
        delete(&mut snap, &ids[3]).unwrap();
        for (i, id) in ids.iter().enumerate() {
            if i == 3 {
                assert!(snap.node(id).is_none());
            } else {
                assert!(snap.node(id).is_some());
            }
        }
    }
}
