#![deny(missing_docs)]
//! Dynamic R-tree algorithms (Guttman 1984) over a [`gistree_store::Snapshot`].
//!
//! Every operation here is a pure function from one snapshot to the
//! next: `insert`/`update`/`delete` take `&mut Snapshot` and mutate it in
//! place, but never reach outside it for state, which is what lets
//! `gistree_replicator` run the same operations against a snapshot that
//! just arrived over the wire.

mod choose_leaf;
mod delete;
mod insert;
mod query;
mod split;
mod support;
mod update;

pub use delete::{bulk_delete, delete};
pub use insert::{bulk_insert, insert};
pub use query::{query, query_depth};
pub use update::{bulk_update, update};

use gistree_store::Id;
use thiserror::Error;

/// Errors raised by tree operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// `insert` was called with an id that already names an entry.
    #[error("id {0} already exists in the tree")]
    Duplicate(Id),
    /// `update`/`delete` was called with an id that names no entry, or
    /// names an internal node rather than a leaf.
    #[error("id {0} does not name a leaf in the tree")]
    UnknownId(Id),
    /// A caller-supplied bounding box failed validation.
    #[error(transparent)]
    InvalidBox(#[from] gistree_geometry::InvalidBox),
}

#[cfg(test)]
mod tests {
    use super::*;
    use gistree_geometry::Box as Mbb;
    use gistree_store::{NodeRecord, Snapshot, UserKey};
    use proptest::prelude::*;

    fn bbox(min: f64, max: f64) -> Mbb {
        Mbb::new(vec![(min, max)]).unwrap()
    }

    fn assert_structural_invariants(snap: &Snapshot) {
        let root = snap.root();
        for (id, record) in snap.iter_nodes() {
            if let NodeRecord::Internal { children, mbb, .. } = record {
                if &Id::from(root) != id {
                    assert!(
                        children.len() >= 1,
                        "non-root internal node {id} has no children"
                    );
                }
                for child in children {
                    let child_record = snap.node(child).expect("child entry present");
                    assert_eq!(
                        child_record.mbb().enlargement(mbb),
                        0.0,
                        "child {child} escapes parent {id}'s mbb"
                    );
                    assert_eq!(child_record.parent(), Some(gistree_store::NodeId::try_from(id).unwrap()));
                }
            }
        }
    }

    proptest! {
        #[test]
        fn insert_sequence_preserves_structural_invariants(
            values in proptest::collection::vec(-1000i64..1000, 1..40)
        ) {
            let mut snap = Snapshot::empty(4, 1, 99);
            for (i, v) in values.iter().enumerate() {
                let lo = *v as f64;
                let id = Id::User(UserKey::Integer(i as i64));
                if insert(&mut snap, id, bbox(lo, lo + 1.0)).is_ok() {
                    assert_structural_invariants(&snap);
                }
            }
        }

        #[test]
        fn insert_then_delete_every_entry_empties_the_tree(
            values in proptest::collection::vec(-1000i64..1000, 1..25)
        ) {
            let mut snap = Snapshot::empty(3, 1, 17);
            let mut ids = Vec::new();
            for (i, v) in values.iter().enumerate() {
                let lo = *v as f64;
                let id = Id::User(UserKey::Integer(i as i64));
                insert(&mut snap, id.clone(), bbox(lo, lo + 1.0)).unwrap();
                ids.push(id);
            }
            for id in &ids {
                delete(&mut snap, id).unwrap();
                assert_structural_invariants(&snap);
            }
            let root = snap.root();
            match snap.node(&Id::from(root)).unwrap() {
                NodeRecord::Internal { children, .. } => assert!(children.is_empty()),
                NodeRecord::Leaf { .. } => unreachable!(),
            }
        }
    }
}
