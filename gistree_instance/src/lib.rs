#![deny(missing_docs)]
//! The per-peer gistree instance: configuration, error types, and the
//! serialized actor that fronts a tree snapshot for one peer (§5, §6).

mod config;
mod error;
mod instance;

pub use config::{Config, ConfigValue, Mode};
pub use error::Error;
pub use instance::{Instance, Metadata};

pub use gistree_geometry::Box;
pub use gistree_replicator::{PeerRef, ReplicatedMap};
pub use gistree_store::{Id, NodeId, Snapshot, UserKey};
