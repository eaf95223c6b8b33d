#![deny(missing_docs)]
//! Delta-state CRDT replication of a [`gistree_store::Snapshot`] across
//! peers, per the add-wins observed-remove map design of §6.3–§6.4.
//!
//! [`Replicator`] owns the local snapshot and pushes only the keys that
//! actually changed (found via [`gistree_merkle::MerkleMap::diff_keys`])
//! to a [`ReplicatedMap`] implementation; incoming peer state is folded
//! back in by replacing the matching keys rather than recomputing the
//! whole tree.

#[cfg(any(test, feature = "test-util"))]
mod fake;

#[cfg(any(test, feature = "test-util"))]
pub use fake::FakeCrdt;

use async_trait::async_trait;
use gistree_merkle::MerkleMap;
use gistree_store::{Snapshot, SnapshotKey, SnapshotValue};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// A reference to a peer instance, opaque to the replicator itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerRef(pub String);

/// Errors surfaced by a [`ReplicatedMap`] backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The backend could not be reached or is not accepting writes.
    #[error("replicated map unavailable: {0}")]
    Unavailable(String),
}

/// The add-wins observed-remove map interface the replicator pushes
/// changes to and reads merged state from (§6.3). Object-safe so
/// `Instance` can hold one behind `Arc<dyn ReplicatedMap + Send + Sync>`,
/// matching the teacher's `ReplicatedStore` shape.
#[async_trait]
pub trait ReplicatedMap {
    /// Record that `key` now maps to `value`, winning over any concurrent
    /// remove of the same key.
    async fn mutate_add(&self, key: SnapshotKey, value: SnapshotValue) -> Result<(), Error>;

    /// Record the removal of `key`.
    async fn mutate_remove(&self, key: SnapshotKey) -> Result<(), Error>;

    /// The backend's current merged view of every key it knows about.
    async fn read(&self) -> Result<BTreeMap<SnapshotKey, SnapshotValue>, Error>;

    /// Replace the set of peers this map replicates to/from.
    async fn set_neighbours(&self, peers: &[PeerRef]) -> Result<(), Error>;
}

/// Drives one instance's snapshot through a [`ReplicatedMap`] backend:
/// diffing local mutations down to changed keys before pushing, and
/// folding incoming merged state back into the snapshot. Holds the
/// backend as a trait object, matching the teacher's
/// `Arc<dyn ReplicatedStore + Send + Sync>` shape so callers can swap in
/// a real CRDT without the replicator knowing its concrete type.
pub struct Replicator {
    crdt: Arc<dyn ReplicatedMap + Send + Sync>,
    merkle: MerkleMap,
    seeded: bool,
}

impl Replicator {
    /// Start replicating from `initial`. Nothing is sent to `crdt` yet —
    /// the baseline (`Root`, `Ticket`, every node) is pushed lazily on the
    /// first [`Replicator::push_local_change`], so a replicator that never
    /// mutates locally never writes to a backend it might only be reading
    /// from (e.g. a freshly joined peer that only calls `merge_diff`).
    pub fn new(initial: Snapshot, crdt: Arc<dyn ReplicatedMap + Send + Sync>) -> Self {
        Self { crdt, merkle: MerkleMap::new(initial), seeded: false }
    }

    /// The snapshot as currently known locally.
    pub fn snapshot(&self) -> &Snapshot {
        self.merkle.snapshot()
    }

    /// Push every entry of the current baseline to `crdt`, once. Without
    /// this, `Root`/`Ticket` (and any node whose value never changes again
    /// after the very first local mutation) would never reach the CRDT at
    /// all, since `push_local_change` only pushes keys that *differ* from
    /// the last-known baseline — and a wholesale `merge_diff` replace on
    /// another peer depends on those keys being present there.
    async fn ensure_seeded(&mut self) -> Result<(), Error> {
        if self.seeded {
            return Ok(());
        }
        for (key, value) in self.merkle.snapshot().entries() {
            self.crdt.mutate_add(key.clone(), value.clone()).await?;
        }
        self.seeded = true;
        Ok(())
    }

    /// Push every key that differs between the last-known state and
    /// `new_snapshot` to the CRDT backend, then adopt `new_snapshot` as
    /// the new baseline.
    ///
    /// Note (§9): if two peers split the same overfull node concurrently,
    /// each picks a different fresh internal-node id for the new sibling,
    /// so the two diffs never collide on a key — they converge as two
    /// *additional* internal nodes rather than one, which is structurally
    /// valid but leaves the tree temporarily less balanced than either
    /// peer saw locally. No revalidation pass runs after merge.
    pub async fn push_local_change(&mut self, new_snapshot: Snapshot) -> Result<(), Error> {
        self.ensure_seeded().await?;
        let mut incoming = MerkleMap::new(new_snapshot.clone());
        let changed = self.merkle.diff_keys(&mut incoming);
        for key in changed {
            match new_snapshot.get(&key) {
                Some(value) => self.crdt.mutate_add(key, value.clone()).await?,
                None => self.crdt.mutate_remove(key).await?,
            }
        }
        self.merkle = incoming;
        Ok(())
    }

    /// Pull the CRDT's current merged view and replace the local snapshot
    /// with it wholesale: any node entry the local snapshot holds but the
    /// remote map no longer does is dropped (§8 scenario 5/6 — a remote
    /// delete must actually remove the key locally, not just leave it
    /// unrefreshed), then every remote entry is written in. `Root`/
    /// `Ticket` are only ever overwritten, never dropped for being absent
    /// remotely, so a `merge_diff` against a backend nobody has seeded yet
    /// leaves the local tree's required entries intact. Used both for
    /// ordinary convergence after a peer's push and for reconstructing
    /// state when a fresh instance joins with an empty snapshot.
    pub async fn merge_diff(&mut self) -> Result<Snapshot, Error> {
        let remote = self.crdt.read().await?;
        let mut snapshot = self.merkle.snapshot().clone();

        let stale_nodes: Vec<SnapshotKey> = snapshot
            .entries()
            .filter(|(key, _)| matches!(key, SnapshotKey::Node(_)) && !remote.contains_key(key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale_nodes {
            snapshot.delete(&key);
        }
        for (key, value) in remote {
            snapshot.put(key, value);
        }

        self.merkle = MerkleMap::new(snapshot.clone());
        Ok(snapshot)
    }

    /// Update the backend's peer list. Idempotent; an empty list is valid
    /// (a lone instance with no neighbours yet, per §6.4).
    pub async fn set_neighbours(&self, peers: &[PeerRef]) -> Result<(), Error> {
        self.crdt.set_neighbours(peers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gistree_geometry::Box as Mbb;
    use gistree_store::{Id, UserKey};
    use std::sync::Arc;

    fn bbox(min: f64, max: f64) -> Mbb {
        Mbb::new(vec![(min, max)]).unwrap()
    }

    #[tokio::test]
    async fn two_peers_converge_after_exchanging_one_insert() {
        let backend: Arc<dyn ReplicatedMap + Send + Sync> = Arc::new(FakeCrdt::new());
        let snap_a = Snapshot::empty(4, 1, 1);
        let snap_b = Snapshot::empty(4, 1, 1);
        let mut rep_a = Replicator::new(snap_a.clone(), backend.clone());
        let mut rep_b = Replicator::new(snap_b, backend.clone());

        let mut mutated = snap_a;
        gistree_rtree::insert(&mut mutated, Id::User(UserKey::Integer(1)), bbox(0.0, 1.0)).unwrap();
        rep_a.push_local_change(mutated).await.unwrap();

        let converged = rep_b.merge_diff().await.unwrap();
        assert!(converged.get(&gistree_store::SnapshotKey::Node(Id::User(UserKey::Integer(1)))).is_some());
    }

    #[tokio::test]
    async fn set_neighbours_accepts_empty_list() {
        let backend: Arc<dyn ReplicatedMap + Send + Sync> = Arc::new(FakeCrdt::new());
        let rep = Replicator::new(Snapshot::empty(4, 1, 1), backend);
        rep.set_neighbours(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn merge_diff_drops_a_key_the_peer_deleted() {
        let backend: Arc<dyn ReplicatedMap + Send + Sync> = Arc::new(FakeCrdt::new());
        let snap_a = Snapshot::empty(4, 1, 1);
        let snap_b = Snapshot::empty(4, 1, 1);
        let mut rep_a = Replicator::new(snap_a.clone(), backend.clone());
        let mut rep_b = Replicator::new(snap_b, backend.clone());

        let mut inserted = snap_a;
        gistree_rtree::insert(&mut inserted, Id::User(UserKey::Integer(1)), bbox(0.0, 1.0)).unwrap();
        rep_a.push_local_change(inserted.clone()).await.unwrap();

        let converged = rep_b.merge_diff().await.unwrap();
        let key = gistree_store::SnapshotKey::Node(Id::User(UserKey::Integer(1)));
        assert!(converged.get(&key).is_some());

        let mut deleted = inserted;
        gistree_rtree::delete(&mut deleted, &Id::User(UserKey::Integer(1))).unwrap();
        rep_a.push_local_change(deleted).await.unwrap();

        let reconverged = rep_b.merge_diff().await.unwrap();
        assert!(reconverged.get(&key).is_none(), "peer's stale copy of a remotely deleted key must be dropped");
    }

    #[tokio::test]
    async fn merge_diff_against_an_unseeded_backend_keeps_root_and_ticket() {
        let backend: Arc<dyn ReplicatedMap + Send + Sync> = Arc::new(FakeCrdt::new());
        let mut rep = Replicator::new(Snapshot::empty(4, 1, 1), backend);
        let merged = rep.merge_diff().await.unwrap();
        assert!(merged.get(&gistree_store::SnapshotKey::Root).is_some());
        assert!(merged.get(&gistree_store::SnapshotKey::Ticket).is_some());
    }
}
