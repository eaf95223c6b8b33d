//! Node records: the internal/leaf tagged union of §3.

use crate::id::{Id, NodeId};
use gistree_geometry::Box;
use serde::{Deserialize, Serialize};

/// A node record as stored in the tree snapshot map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum NodeRecord {
    /// An internal node: an ordered list of children (leaves and/or other
    /// internal nodes) and the bounding box enclosing them all.
    Internal {
        /// Children in insertion order.
        children: Vec<Id>,
        /// `None` only for the root.
        parent: Option<NodeId>,
        /// The union of all children's bounding boxes.
        mbb: Box,
    },
    /// A leaf: the user-supplied bounding box for one id.
    Leaf {
        /// The internal node this leaf is currently a child of.
        parent: NodeId,
        /// The user-supplied bounding box.
        mbb: Box,
    },
}

impl NodeRecord {
    /// The record's current bounding box.
    pub fn mbb(&self) -> &Box {
        match self {
            NodeRecord::Internal { mbb, .. } => mbb,
            NodeRecord::Leaf { mbb, .. } => mbb,
        }
    }

    /// The record's parent, or `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        match self {
            NodeRecord::Internal { parent, .. } => *parent,
            NodeRecord::Leaf { parent, .. } => Some(*parent),
        }
    }

    /// True if this record is an internal node.
    pub fn is_internal(&self) -> bool {
        matches!(self, NodeRecord::Internal { .. })
    }

    /// Children, if this is an internal node.
    pub fn children(&self) -> Option<&[Id]> {
        match self {
            NodeRecord::Internal { children, .. } => Some(children),
            NodeRecord::Leaf { .. } => None,
        }
    }
}
