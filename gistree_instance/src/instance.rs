//! The per-peer actor (§5, §6.2, §6.4): every request is serialized
//! through a single `tokio::sync::mpsc` mailbox so concurrent callers
//! observe a strict total order of mutations, the way the teacher's
//! `serin_pool`/`serin_shard` route work through one owner task but
//! generalized here into an explicit mailbox loop rather than a shared
//! router trait, since total ordering per instance is a hard requirement
//! and a shared-router alone doesn't guarantee it under concurrent
//! callers.

use crate::config::{Config, Mode};
use crate::error::Error;
use gistree_geometry::Box as Mbb;
use gistree_replicator::{PeerRef, ReplicatedMap, Replicator};
use gistree_store::{Id, NodeId, Snapshot};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::instrument;

/// Tree-wide facts about a running instance, returned by
/// [`Instance::metadata`].
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Maximum children per internal node.
    pub width: usize,
    /// Fixed box dimensionality.
    pub dimensionality: usize,
    /// Standalone or distributed.
    pub mode: Mode,
    /// Number of entries currently stored in the tree snapshot map.
    pub entry_count: usize,
    /// Peers currently registered with the replicator, if distributed.
    pub neighbours: Vec<PeerRef>,
}

enum Command {
    Insert(Id, Mbb, oneshot::Sender<Result<Snapshot, Error>>),
    BulkInsert(Vec<(Id, Mbb)>, oneshot::Sender<Result<Snapshot, Error>>),
    Query(Mbb, oneshot::Sender<Vec<Id>>),
    QueryDepth(Mbb, usize, oneshot::Sender<Vec<NodeId>>),
    Update(Id, Mbb, oneshot::Sender<Result<Snapshot, Error>>),
    BulkUpdate(Vec<(Id, Mbb)>, oneshot::Sender<Result<Snapshot, Error>>),
    Delete(Id, oneshot::Sender<Result<Snapshot, Error>>),
    BulkDelete(Vec<Id>, oneshot::Sender<Result<Snapshot, Error>>),
    Tree(oneshot::Sender<Snapshot>),
    Metadata(oneshot::Sender<Metadata>),
    NodeUp(PeerRef, oneshot::Sender<Result<(), Error>>),
    NodeDown(PeerRef, oneshot::Sender<Result<(), Error>>),
    MergeDiff(oneshot::Sender<Result<Snapshot, Error>>),
}

/// A handle to a running gistree instance. Cloning the handle is cheap
/// (it is just a sender); every clone talks to the same serialized
/// mailbox.
#[derive(Clone)]
pub struct Instance {
    sender: mpsc::Sender<Command>,
}

struct Worker {
    snapshot: Snapshot,
    replicator: Option<Replicator>,
    neighbours: Vec<PeerRef>,
    config: Config,
}

impl Instance {
    /// Spawn a new instance's mailbox task from `config`. In
    /// [`Mode::Distributed`], `crdt` must be `Some`; it is ignored in
    /// standalone mode.
    pub fn spawn(config: Config, crdt: Option<Arc<dyn ReplicatedMap + Send + Sync>>) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Command>(64);
        let snapshot = Snapshot::empty(config.width, config.dimensionality, config.seed);
        let replicator = match (config.mode, crdt) {
            (Mode::Distributed, Some(backend)) => Some(Replicator::new(snapshot.clone(), backend)),
            _ => None,
        };
        let mut worker = Worker { snapshot, replicator, neighbours: Vec::new(), config };

        tokio::spawn(async move {
            while let Some(cmd) = receiver.recv().await {
                worker.handle(cmd).await;
            }
        });

        Self { sender }
    }

    /// Insert one entry.
    pub async fn insert(&self, id: Id, bbox: Mbb) -> Result<Snapshot, Error> {
        self.call(|tx| Command::Insert(id, bbox, tx)).await
    }

    /// Insert many entries as a sequential fold.
    pub async fn bulk_insert(&self, entries: Vec<(Id, Mbb)>) -> Result<Snapshot, Error> {
        self.call(|tx| Command::BulkInsert(entries, tx)).await
    }

    /// All leaf ids overlapping `query_box`.
    pub async fn query(&self, query_box: Mbb) -> Vec<Id> {
        self.call(|tx| Command::Query(query_box, tx)).await
    }

    /// The internal-node ids sitting exactly `depth` levels below the root
    /// (depth 0 = root) whose mbb overlaps `query_box`, for diagnostics.
    pub async fn query_depth(&self, query_box: Mbb, depth: usize) -> Vec<NodeId> {
        self.call(|tx| Command::QueryDepth(query_box, depth, tx)).await
    }

    /// Replace one leaf's bounding box.
    pub async fn update(&self, id: Id, bbox: Mbb) -> Result<Snapshot, Error> {
        self.call(|tx| Command::Update(id, bbox, tx)).await
    }

    /// Replace many leaves' bounding boxes as a sequential fold.
    pub async fn bulk_update(&self, entries: Vec<(Id, Mbb)>) -> Result<Snapshot, Error> {
        self.call(|tx| Command::BulkUpdate(entries, tx)).await
    }

    /// Remove one leaf.
    pub async fn delete(&self, id: Id) -> Result<Snapshot, Error> {
        self.call(|tx| Command::Delete(id, tx)).await
    }

    /// Remove many leaves as a sequential fold.
    pub async fn bulk_delete(&self, ids: Vec<Id>) -> Result<Snapshot, Error> {
        self.call(|tx| Command::BulkDelete(ids, tx)).await
    }

    /// A copy of the current tree snapshot.
    pub async fn tree(&self) -> Snapshot {
        self.call(Command::Tree).await
    }

    /// Tree-wide metadata: width, dimensionality, mode, entry count.
    pub async fn metadata(&self) -> Metadata {
        self.call(Command::Metadata).await
    }

    /// Register a peer as reachable, pushing the updated neighbour list
    /// to the replicator. A no-op in standalone mode.
    pub async fn node_up(&self, peer: PeerRef) -> Result<(), Error> {
        self.call(|tx| Command::NodeUp(peer, tx)).await
    }

    /// Remove a peer from the neighbour list. A no-op in standalone mode.
    pub async fn node_down(&self, peer: PeerRef) -> Result<(), Error> {
        self.call(|tx| Command::NodeDown(peer, tx)).await
    }

    /// Pull and fold in the replicator's current merged view. A no-op
    /// returning the unchanged local snapshot in standalone mode.
    pub async fn merge_diff(&self) -> Result<Snapshot, Error> {
        self.call(Command::MergeDiff).await
    }

    async fn call<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> T {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .expect("instance mailbox task is never dropped before its handle");
        rx.await.expect("instance worker always responds before moving on")
    }
}

impl Worker {
    #[instrument(skip(self, cmd))]
    async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Insert(id, bbox, tx) => {
                let _ = tx.send(self.mutate(|s| gistree_rtree::insert(s, id, bbox)).await);
            }
            Command::BulkInsert(entries, tx) => {
                let _ = tx.send(self.mutate(|s| gistree_rtree::bulk_insert(s, entries)).await);
            }
            Command::Query(query_box, tx) => {
                let _ = tx.send(gistree_rtree::query(&self.snapshot, &query_box));
            }
            Command::QueryDepth(query_box, depth, tx) => {
                let _ = tx.send(gistree_rtree::query_depth(&self.snapshot, &query_box, depth));
            }
            Command::Update(id, bbox, tx) => {
                let _ = tx.send(self.mutate(|s| gistree_rtree::update(s, &id, bbox)).await);
            }
            Command::BulkUpdate(entries, tx) => {
                let _ = tx.send(self.mutate(|s| gistree_rtree::bulk_update(s, entries)).await);
            }
            Command::Delete(id, tx) => {
                let _ = tx.send(self.mutate(|s| gistree_rtree::delete(s, &id)).await);
            }
            Command::BulkDelete(ids, tx) => {
                let _ = tx.send(self.mutate(|s| gistree_rtree::bulk_delete(s, &ids)).await);
            }
            Command::Tree(tx) => {
                let _ = tx.send(self.snapshot.clone());
            }
            Command::Metadata(tx) => {
                let _ = tx.send(Metadata {
                    width: self.config.width,
                    dimensionality: self.config.dimensionality,
                    mode: self.config.mode,
                    entry_count: self.snapshot.len(),
                    neighbours: self.neighbours.clone(),
                });
            }
            Command::NodeUp(peer, tx) => {
                if !self.neighbours.contains(&peer) {
                    self.neighbours.push(peer);
                }
                let _ = tx.send(self.push_neighbours().await);
            }
            Command::NodeDown(peer, tx) => {
                self.neighbours.retain(|p| p != &peer);
                let _ = tx.send(self.push_neighbours().await);
            }
            Command::MergeDiff(tx) => {
                let result = match &mut self.replicator {
                    Some(rep) => rep.merge_diff().await.map_err(Error::from),
                    None => Ok(self.snapshot.clone()),
                };
                if let Ok(ref snapshot) = result {
                    self.snapshot = snapshot.clone();
                }
                let _ = tx.send(result);
            }
        }
    }

    async fn push_neighbours(&self) -> Result<(), Error> {
        match &self.replicator {
            Some(rep) => rep.set_neighbours(&self.neighbours).await.map_err(Error::from),
            None => Ok(()),
        }
    }

    async fn mutate(
        &mut self,
        op: impl FnOnce(&mut Snapshot) -> Result<(), gistree_rtree::Error>,
    ) -> Result<Snapshot, Error> {
        let mut next = self.snapshot.clone();
        op(&mut next)?;
        if let Some(rep) = &mut self.replicator {
            rep.push_local_change(next.clone()).await?;
        }
        self.snapshot = next.clone();
        if self.config.verbose {
            tracing::debug!(entries = self.snapshot.len(), "mutated tree");
        }
        Ok(next)
    }
}
