//! The instance-level error type (§7), unifying the lower crates' errors
//! the way `serin_txn::lock::DeadlockError` wraps a lock-table failure for
//! its callers.

use gistree_store::Id;
use thiserror::Error;

/// Errors an `Instance` can return to a caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// An operation was issued before the instance finished initializing.
    #[error("tree is not yet initialized")]
    BadTree,
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
    /// The replicated map backend could not be reached.
    #[error(transparent)]
    Replication(#[from] gistree_replicator::Error),
}

impl From<gistree_rtree::Error> for Error {
    fn from(err: gistree_rtree::Error) -> Self {
        match err {
            gistree_rtree::Error::Duplicate(id) => Error::Duplicate(id),
            gistree_rtree::Error::UnknownId(id) => Error::UnknownId(id),
            gistree_rtree::Error::InvalidBox(b) => Error::InvalidBox(b),
        }
    }
}
