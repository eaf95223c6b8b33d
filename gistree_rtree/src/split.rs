//! Quadratic PickSeeds / PickNext node splitting (Guttman 1984), per §4.3.
//!
//! The teacher's `serin_index::rtree` split (`split_str`) is an STR
//! bulk-load packer, built for loading a whole dataset at once; it is not
//! applicable to splitting a single overfull node during an incremental
//! insert, which is what this algorithm replaces it with. The tie-break
//! rules below mirror `choose_leaf`'s enlargement → area → id ordering.

use crate::support::min_children;
use gistree_store::{Id, Snapshot};

/// Split an overfull node's `width + 1` children into two groups.
pub(crate) fn split_children(snapshot: &Snapshot, entries: &[Id], width: usize) -> (Vec<Id>, Vec<Id>) {
    let min = min_children(width);
    let mbb_of = |id: &Id| snapshot.node(id).expect("entry present").mbb().clone();

    // PickSeeds: the pair that would waste the most area if kept together.
    let mut seed_i = 0;
    let mut seed_j = 1;
    let mut best_waste = f64::NEG_INFINITY;
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            let bi = mbb_of(&entries[i]);
            let bj = mbb_of(&entries[j]);
            let waste = bi.union(&bj).area() - bi.area() - bj.area();
            if waste > best_waste {
                best_waste = waste;
                seed_i = i;
                seed_j = j;
            }
        }
    }

    let mut group_a = vec![entries[seed_i].clone()];
    let mut group_b = vec![entries[seed_j].clone()];
    let mut mbb_a = mbb_of(&entries[seed_i]);
    let mut mbb_b = mbb_of(&entries[seed_j]);

    let mut rest: Vec<Id> = entries
        .iter()
        .enumerate()
        .filter(|&(k, _)| k != seed_i && k != seed_j)
        .map(|(_, id)| id.clone())
        .collect();

    while !rest.is_empty() {
        if group_a.len() + rest.len() <= min {
            group_a.extend(rest.drain(..));
            break;
        }
        if group_b.len() + rest.len() <= min {
            group_b.extend(rest.drain(..));
            break;
        }
        let id = rest.remove(0);
        let b = mbb_of(&id);
        let enl_a = mbb_a.enlargement(&b);
        let enl_b = mbb_b.enlargement(&b);
        let to_a = if enl_a != enl_b {
            enl_a < enl_b
        } else if mbb_a.area() != mbb_b.area() {
            mbb_a.area() < mbb_b.area()
        } else {
            group_a[0] < group_b[0]
        };
        if to_a {
            mbb_a = mbb_a.union(&b);
            group_a.push(id);
        } else {
            mbb_b = mbb_b.union(&b);
            group_b.push(id);
        }
    }

    (group_a, group_b)
}
