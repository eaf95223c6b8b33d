//! Node/leaf map, NodeId generation, and the flat tree snapshot that
//! backs the gistree spatial index (§3, §4.2 of the design).
#![deny(missing_docs)]

mod id;
mod node;
mod snapshot;
mod ticket;

pub use gistree_geometry::Box;
pub use id::{Id, NodeId, UserKey};
pub use node::NodeRecord;
pub use snapshot::{Snapshot, SnapshotKey, SnapshotValue};
pub use ticket::Ticket;
