//! The flat tree snapshot: a mapping from key to value, per §3. Keeping
//! the tree as one flat `BTreeMap` (not a pointer graph) is what makes
//! replication trivial later — all structural information lives in the
//! values, so replicating the map replicates the tree.

use crate::id::{Id, NodeId};
use crate::node::NodeRecord;
use crate::ticket::Ticket;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A key into the tree snapshot map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SnapshotKey {
    /// The current root's id.
    Root,
    /// The RNG ticket used to generate fresh internal-node ids.
    Ticket,
    /// A node (internal or leaf) keyed by its id.
    Node(Id),
}

/// A value in the tree snapshot map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SnapshotValue {
    /// The current root's id.
    Root(NodeId),
    /// The RNG ticket state.
    Ticket(Ticket),
    /// A node record.
    Node(NodeRecord),
}

/// The tree snapshot: root pointer, RNG ticket, and every node record,
/// plus the tree-wide `width` and `dimensionality` fixed at construction
/// (§6.1 — these are config, not per-node state, so they live alongside
/// the map rather than as entries in it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    entries: BTreeMap<SnapshotKey, SnapshotValue>,
    /// Maximum children per internal node.
    pub width: usize,
    /// Fixed dimensionality of every box in this tree.
    pub dimensionality: usize,
}

impl Snapshot {
    /// Construct a fresh, empty tree: a root internal node with zero
    /// children and the zero box, per §3 invariant 5.
    pub fn empty(width: usize, dimensionality: usize, seed: u64) -> Self {
        let mut entries = BTreeMap::new();
        let ticket = Ticket::seeded(seed);
        let (root_id, ticket) = ticket.fresh_id();
        entries.insert(SnapshotKey::Ticket, SnapshotValue::Ticket(ticket));
        entries.insert(SnapshotKey::Root, SnapshotValue::Root(root_id));
        entries.insert(
            SnapshotKey::Node(Id::from(root_id)),
            SnapshotValue::Node(NodeRecord::Internal {
                children: Vec::new(),
                parent: None,
                mbb: gistree_geometry::Box::empty(dimensionality),
            }),
        );
        Self { entries, width, dimensionality }
    }

    /// The current root id.
    pub fn root(&self) -> NodeId {
        match self.entries.get(&SnapshotKey::Root) {
            Some(SnapshotValue::Root(id)) => *id,
            _ => unreachable!("snapshot invariant: root entry always present"),
        }
    }

    fn set_root(&mut self, id: NodeId) {
        self.entries.insert(SnapshotKey::Root, SnapshotValue::Root(id));
    }

    /// The current RNG ticket.
    pub fn ticket(&self) -> Ticket {
        match self.entries.get(&SnapshotKey::Ticket) {
            Some(SnapshotValue::Ticket(t)) => *t,
            _ => unreachable!("snapshot invariant: ticket entry always present"),
        }
    }

    /// Generate a fresh internal-node id, advancing and storing the ticket.
    pub fn fresh_id(&mut self) -> NodeId {
        let (id, next) = self.ticket().fresh_id();
        self.entries.insert(SnapshotKey::Ticket, SnapshotValue::Ticket(next));
        id
    }

    /// Look up a node record by id.
    pub fn node(&self, id: &Id) -> Option<&NodeRecord> {
        match self.entries.get(&SnapshotKey::Node(id.clone())) {
            Some(SnapshotValue::Node(n)) => Some(n),
            _ => None,
        }
    }

    /// Insert or replace a node record.
    pub fn put_node(&mut self, id: Id, record: NodeRecord) {
        self.entries.insert(SnapshotKey::Node(id), SnapshotValue::Node(record));
    }

    /// Remove a node record, if present.
    pub fn remove_node(&mut self, id: &Id) {
        self.entries.remove(&SnapshotKey::Node(id.clone()));
    }

    /// Set a new root id (used when the tree gains or loses a level).
    pub fn replace_root(&mut self, id: NodeId) {
        self.set_root(id);
    }

    /// True if `id` names a leaf entry.
    pub fn is_leaf(&self, id: &Id) -> bool {
        matches!(self.node(id), Some(NodeRecord::Leaf { .. }))
    }

    /// Iterate all node entries as `(id, record)` pairs.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (&Id, &NodeRecord)> {
        self.entries.iter().filter_map(|(k, v)| match (k, v) {
            (SnapshotKey::Node(id), SnapshotValue::Node(n)) => Some((id, n)),
            _ => None,
        })
    }

    /// Generic key→value lookup (§4.7 `get`), used by the Merkle wrapper
    /// and the replicator so both can treat the tree as an opaque map.
    pub fn get(&self, key: &SnapshotKey) -> Option<&SnapshotValue> {
        self.entries.get(key)
    }

    /// Generic key→value insert (§4.7 `put`).
    pub fn put(&mut self, key: SnapshotKey, value: SnapshotValue) {
        self.entries.insert(key, value);
    }

    /// Generic key delete (§4.7 `delete`).
    pub fn delete(&mut self, key: &SnapshotKey) {
        self.entries.remove(key);
    }

    /// All entries, in key order — a stable iteration order is what lets
    /// the Merkle hasher build a deterministic hash tree (§4.7).
    pub fn entries(&self) -> impl Iterator<Item = (&SnapshotKey, &SnapshotValue)> {
        self.entries.iter()
    }

    /// Number of entries in the map (root + ticket + every node).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the map holds only the root and ticket entries (the empty
    /// tree's root always exists with zero children, so this never
    /// literally returns true for `width`/`dimensionality` reasons alone —
    /// provided for symmetry with `len`).
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 2
    }
}
