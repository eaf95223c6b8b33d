//! Leaf and node identifiers.
//!
//! Per the design note on dynamic typing of `Id`, user-supplied leaf keys
//! and RNG-generated internal-node keys are unified under one tagged
//! variant so a generated id can never collide with a user id of the same
//! numeric value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A user-supplied leaf key: either an integer or a string-like value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UserKey {
    /// Integer-valued key.
    Integer(i64),
    /// String-valued key.
    Text(String),
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserKey::Integer(i) => write!(f, "{i}"),
            UserKey::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A node reference: either a user-supplied leaf key or an RNG-generated
/// internal-node key. Every key in a [`Snapshot`](crate::Snapshot) — and
/// every entry in an internal node's `children` list — is one of these.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Id {
    /// A leaf, keyed by its user-supplied id.
    User(UserKey),
    /// An internal node, keyed by an RNG-generated 64-bit value with its
    /// top bit reserved (see [`crate::ticket`]).
    Generated(u64),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::User(k) => write!(f, "{k}"),
            Id::Generated(n) => write!(f, "#{n:016x}"),
        }
    }
}

/// A refinement of [`Id`] known to reference an internal node. Internal
/// nodes are always parents; this keeps a leaf or internal node's `parent`
/// field from accidentally being constructed out of a user key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// The raw generated value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<NodeId> for Id {
    fn from(n: NodeId) -> Self {
        Id::Generated(n.0)
    }
}

impl TryFrom<Id> for NodeId {
    type Error = ();

    /// Succeeds only for the `Generated` variant — a user key never
    /// refers to an internal node.
    fn try_from(id: Id) -> Result<Self, Self::Error> {
        match id {
            Id::Generated(v) => Ok(NodeId(v)),
            Id::User(_) => Err(()),
        }
    }
}

impl TryFrom<&Id> for NodeId {
    type Error = ();

    fn try_from(id: &Id) -> Result<Self, Self::Error> {
        match id {
            Id::Generated(v) => Ok(NodeId(*v)),
            Id::User(_) => Err(()),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:016x}", self.0)
    }
}
