#![deny(missing_docs)]
//! A Merkle-indexed wrapper over [`gistree_store::Snapshot`] that lets two
//! replicas find the keys they disagree on without scanning every entry.
//!
//! Keys are bucketed by the first byte of `sha256(key)` rather than by
//! position in sorted order, so an insert or delete elsewhere in the map
//! never shifts which bucket an unrelated key falls into — this is what
//! keeps `diff_keys` proportional to the number of buckets that actually
//! changed instead of the whole key set.

use gistree_store::{Snapshot, SnapshotKey, SnapshotValue};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

const BUCKET_COUNT: usize = 256;

/// A snapshot plus a lazily maintained hash tree over its entries.
pub struct MerkleMap {
    snapshot: Snapshot,
    buckets: Vec<Vec<(SnapshotKey, [u8; 32])>>,
    bucket_hashes: Vec<[u8; 32]>,
    dirty: bool,
}

impl MerkleMap {
    /// Wrap a snapshot, deferring the hash tree build to the first call
    /// that needs it.
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            buckets: vec![Vec::new(); BUCKET_COUNT],
            bucket_hashes: vec![[0u8; 32]; BUCKET_COUNT],
            dirty: true,
        }
    }

    /// The wrapped snapshot, read-only.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Consume the wrapper, returning the inner snapshot.
    pub fn into_snapshot(self) -> Snapshot {
        self.snapshot
    }

    /// Read a value by key (§4.7 `get`), delegating to the snapshot.
    pub fn get(&self, key: &SnapshotKey) -> Option<&SnapshotValue> {
        self.snapshot.get(key)
    }

    /// Insert or replace a value, invalidating the hash tree.
    pub fn put(&mut self, key: SnapshotKey, value: SnapshotValue) {
        self.snapshot.put(key, value);
        self.dirty = true;
    }

    /// Remove a value, invalidating the hash tree.
    pub fn delete(&mut self, key: &SnapshotKey) {
        self.snapshot.delete(key);
        self.dirty = true;
    }

    /// Rebuild the bucket hash tree from the current snapshot contents, if
    /// it has changed since the last build. Idempotent.
    pub fn update_hashes(&mut self) {
        if !self.dirty {
            return;
        }
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        for (key, value) in self.snapshot.entries() {
            let leaf = leaf_hash(key, value);
            let b = bucket_of(key);
            self.buckets[b].push((key.clone(), leaf));
        }
        for (i, bucket) in self.buckets.iter_mut().enumerate() {
            bucket.sort_by(|a, b| a.0.cmp(&b.0));
            self.bucket_hashes[i] = bucket_hash(bucket.as_slice());
        }
        self.dirty = false;
    }

    /// The root hash of the current hash tree, rebuilding first if stale.
    pub fn root_hash(&mut self) -> [u8; 32] {
        self.update_hashes();
        let mut hasher = Sha256::new();
        for h in &self.bucket_hashes {
            hasher.update(h);
        }
        hasher.finalize().into()
    }

    /// Keys whose value differs (present-in-one, absent-in-other, or
    /// changed) between `self` and `other`, computed by comparing bucket
    /// hashes first and only descending into buckets that disagree.
    pub fn diff_keys(&mut self, other: &mut MerkleMap) -> BTreeSet<SnapshotKey> {
        self.update_hashes();
        other.update_hashes();
        let mut changed = BTreeSet::new();
        for i in 0..BUCKET_COUNT {
            if self.bucket_hashes[i] == other.bucket_hashes[i] {
                continue;
            }
            diff_bucket(&self.buckets[i], &other.buckets[i], &mut changed);
        }
        changed
    }
}

fn diff_bucket(
    a: &[(SnapshotKey, [u8; 32])],
    b: &[(SnapshotKey, [u8; 32])],
    changed: &mut BTreeSet<SnapshotKey>,
) {
    let mut ai = a.iter().peekable();
    let mut bi = b.iter().peekable();
    loop {
        match (ai.peek(), bi.peek()) {
            (Some((ka, ha)), Some((kb, hb))) => {
                if ka == kb {
                    if ha != hb {
                        changed.insert(ka.clone());
                    }
                    ai.next();
                    bi.next();
                } else if ka < kb {
                    changed.insert(ka.clone());
                    ai.next();
                } else {
                    changed.insert(kb.clone());
                    bi.next();
                }
            }
            (Some((ka, _)), None) => {
                changed.insert(ka.clone());
                ai.next();
            }
            (None, Some((kb, _))) => {
                changed.insert(kb.clone());
                bi.next();
            }
            (None, None) => break,
        }
    }
}

fn leaf_hash(key: &SnapshotKey, value: &SnapshotValue) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(key).expect("SnapshotKey always serializes"));
    hasher.update(serde_json::to_vec(value).expect("SnapshotValue always serializes"));
    hasher.finalize().into()
}

fn bucket_hash(entries: &[(SnapshotKey, [u8; 32])]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for (_, leaf) in entries {
        hasher.update(leaf);
    }
    hasher.finalize().into()
}

fn bucket_of(key: &SnapshotKey) -> usize {
    let bytes = serde_json::to_vec(key).expect("SnapshotKey always serializes");
    let digest = Sha256::digest(bytes);
    digest[0] as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use gistree_rtree::insert;
    use gistree_store::{Id, UserKey};

    fn bbox(min: f64, max: f64) -> gistree_geometry::Box {
        gistree_geometry::Box::new(vec![(min, max)]).unwrap()
    }

    #[test]
    fn identical_snapshots_have_no_diff() {
        let mut a = Snapshot::empty(4, 1, 1);
        insert(&mut a, Id::User(UserKey::Integer(1)), bbox(0.0, 1.0)).unwrap();
        let b = a.clone();
        let mut ma = MerkleMap::new(a);
        let mut mb = MerkleMap::new(b);
        assert!(ma.diff_keys(&mut mb).is_empty());
        assert_eq!(ma.root_hash(), mb.root_hash());
    }

    #[test]
    fn inserting_one_entry_changes_exactly_its_key() {
        let mut a = Snapshot::empty(4, 1, 1);
        insert(&mut a, Id::User(UserKey::Integer(1)), bbox(0.0, 1.0)).unwrap();
        let mut b = a.clone();
        insert(&mut b, Id::User(UserKey::Integer(2)), bbox(2.0, 3.0)).unwrap();

        let mut ma = MerkleMap::new(a);
        let mut mb = MerkleMap::new(b);
        let diff = ma.diff_keys(&mut mb);
        assert!(diff.contains(&SnapshotKey::Node(Id::User(UserKey::Integer(2)))));
        // the root's mbb grew to cover the new leaf, so it differs too.
        assert!(diff.len() >= 1);
    }

    #[test]
    fn changing_a_value_is_detected() {
        let mut a = Snapshot::empty(4, 1, 1);
        insert(&mut a, Id::User(UserKey::Integer(1)), bbox(0.0, 1.0)).unwrap();
        let mut b = a.clone();
        gistree_rtree::update(&mut b, &Id::User(UserKey::Integer(1)), bbox(5.0, 6.0)).unwrap();

        let mut ma = MerkleMap::new(a);
        let mut mb = MerkleMap::new(b);
        let diff = ma.diff_keys(&mut mb);
        assert!(diff.contains(&SnapshotKey::Node(Id::User(UserKey::Integer(1)))));
    }
}
