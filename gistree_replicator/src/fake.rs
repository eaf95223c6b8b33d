//! An in-memory [`ReplicatedMap`] for tests, grounded on
//! `serin_multidc::MemoryStore`'s `Mutex<HashMap<...>>` plus
//! conflict-resolution-on-insert pattern. Add-wins, last-write-wins on
//! concurrent adds of the same key: whichever `mutate_add` lands last in
//! the mutex wins, matching the spec's add-wins observed-remove map.

use crate::{Error, PeerRef, ReplicatedMap};
use async_trait::async_trait;
use gistree_store::{SnapshotKey, SnapshotValue};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// A shared in-memory backend. Clone the `Arc` around it, not the struct
/// itself, so every peer in a test sees the same merged state.
pub struct FakeCrdt {
    entries: Mutex<BTreeMap<SnapshotKey, SnapshotValue>>,
    neighbours: Mutex<Vec<PeerRef>>,
}

impl FakeCrdt {
    /// An empty backend with no known entries or peers.
    pub fn new() -> Self {
        Self { entries: Mutex::new(BTreeMap::new()), neighbours: Mutex::new(Vec::new()) }
    }
}

impl Default for FakeCrdt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplicatedMap for FakeCrdt {
    async fn mutate_add(&self, key: SnapshotKey, value: SnapshotValue) -> Result<(), Error> {
        self.entries
            .lock()
            .map_err(|_| Error::Unavailable("fake crdt mutex poisoned".into()))?
            .insert(key, value);
        Ok(())
    }

    async fn mutate_remove(&self, key: SnapshotKey) -> Result<(), Error> {
        self.entries
            .lock()
            .map_err(|_| Error::Unavailable("fake crdt mutex poisoned".into()))?
            .remove(&key);
        Ok(())
    }

    async fn read(&self) -> Result<BTreeMap<SnapshotKey, SnapshotValue>, Error> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| Error::Unavailable("fake crdt mutex poisoned".into()))?
            .clone())
    }

    async fn set_neighbours(&self, peers: &[PeerRef]) -> Result<(), Error> {
        *self
            .neighbours
            .lock()
            .map_err(|_| Error::Unavailable("fake crdt mutex poisoned".into()))? = peers.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn last_add_wins_on_conflicting_key() {
        let crdt = FakeCrdt::new();
        let key = SnapshotKey::Root;
        crdt.mutate_add(key.clone(), SnapshotValue::Root(gistree_store::NodeId::try_from(gistree_store::Id::Generated(1)).unwrap())).await.unwrap();
        crdt.mutate_add(key.clone(), SnapshotValue::Root(gistree_store::NodeId::try_from(gistree_store::Id::Generated(2)).unwrap())).await.unwrap();
        let state = crdt.read().await.unwrap();
        assert_eq!(
            state.get(&key),
            Some(&SnapshotValue::Root(gistree_store::NodeId::try_from(gistree_store::Id::Generated(2)).unwrap()))
        );
    }

    #[tokio::test]
    async fn remove_then_read_drops_key() {
        let crdt = FakeCrdt::new();
        let key = SnapshotKey::Node(gistree_store::Id::User(gistree_store::UserKey::Integer(1)));
        crdt.mutate_add(
            key.clone(),
            SnapshotValue::Node(gistree_store::NodeRecord::Leaf {
                parent: gistree_store::NodeId::try_from(gistree_store::Id::Generated(1)).unwrap(),
                mbb: gistree_geometry::Box::new(vec![(0.0, 1.0)]).unwrap(),
            }),
        )
        .await
        .unwrap();
        crdt.mutate_remove(key.clone()).await.unwrap();
        assert!(crdt.read().await.unwrap().get(&key).is_none());
    }
}
