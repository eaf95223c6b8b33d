//! Update (§4.5): replace a leaf's bounding box in place, without moving
//! it to a different leaf parent. Ancestor mbbs are refreshed with an
//! early stop the moment an ancestor's union no longer changes — unlike
//! insert's full-path walk, most updates don't touch every ancestor.

use crate::support::union_of;
use gistree_store::{Box as Mbb, Id, NodeId, NodeRecord, Snapshot};

/// Replace the bounding box stored for `id`. Errors if `id` is unknown or
/// names an internal node rather than a leaf.
pub fn update(snapshot: &mut Snapshot, id: &Id, new_bbox: Mbb) -> Result<(), crate::Error> {
    let parent = match snapshot.node(id) {
        Some(NodeRecord::Leaf { parent, .. }) => *parent,
        Some(NodeRecord::Internal { .. }) | None => return Err(crate::Error::UnknownId(id.clone())),
    };
    snapshot.put_node(id.clone(), NodeRecord::Leaf { parent, mbb: new_bbox });
    refresh_ancestors_with_early_stop(snapshot, Some(parent));
    Ok(())
}

/// Apply many updates in sequence.
pub fn bulk_update(snapshot: &mut Snapshot, entries: Vec<(Id, Mbb)>) -> Result<(), crate::Error> {
    for (id, bbox) in entries {
        update(snapshot, &id, bbox)?;
    }
    Ok(())
}

fn refresh_ancestors_with_early_stop(snapshot: &mut Snapshot, mut node_id: Option<NodeId>) {
    while let Some(id) = node_id {
        let (children, parent, old_mbb) = match snapshot.node(&Id::from(id)) {
            Some(NodeRecord::Internal { children, parent, mbb }) => (children.clone(), *parent, mbb.clone()),
            _ => return,
        };
        let new_mbb = union_of(snapshot, &children);
        if new_mbb == old_mbb {
            return;
        }
        snapshot.put_node(Id::from(id), NodeRecord::Internal { children, parent, mbb: new_mbb });
        node_id = parent;
    }
}
