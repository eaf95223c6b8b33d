//! ChooseLeaf (§4.3): descend from the root picking the least-enlarging
//! child at each level, until reaching the node whose children are
//! leaves (or which has no children yet).

use gistree_store::{Id, NodeId, NodeRecord, Snapshot};

pub(crate) fn choose_leaf(snapshot: &Snapshot, bbox: &gistree_store::Box) -> NodeId {
    let mut current = snapshot.root();
    loop {
        let record = snapshot
            .node(&Id::from(current))
            .expect("choose_leaf only walks existing internal nodes");
        let children = match record {
            NodeRecord::Internal { children, .. } => children,
            NodeRecord::Leaf { .. } => unreachable!("choose_leaf never descends into a leaf"),
        };

        let is_leaf_level = children.is_empty() || snapshot.is_leaf(&children[0]);
        if is_leaf_level {
            return current;
        }

        let mut best_idx = 0;
        let mut best_enl = f64::INFINITY;
        let mut best_area = f64::INFINITY;
        let mut best_id: Option<NodeId> = None;
        for (idx, child) in children.iter().enumerate() {
            let child_node_id = NodeId::try_from(child).expect("internal-level child is generated");
            let child_mbb = snapshot.node(child).unwrap().mbb();
            let enl = child_mbb.enlargement(bbox);
            let area = child_mbb.area();
            let better = enl < best_enl
                || (enl == best_enl && area < best_area)
                || (enl == best_enl
                    && area == best_area
                    && best_id.map(|b| child_node_id < b).unwrap_or(true));
            if better {
                best_idx = idx;
                best_enl = enl;
                best_area = area;
                best_id = Some(child_node_id);
            }
        }
        current = NodeId::try_from(&children[best_idx]).expect("internal-level child is generated");
    }
}
