//! Face-adjacency layer growth.
//!
//! Multi-source breadth-first growth where every seed carries its own hop
//! radius. A cell is reached when some seed lies within that seed's radius,
//! counting hops over face neighbours that satisfy the `passable` predicate.
//! The queue is bucketed by remaining radius and drained from the largest
//! bucket down, so each cell is settled once with the largest remaining
//! radius of any seed that reaches it.

use crate::topology::connectivity::ConnectivityView;
use crate::topology::point::CellId;

/// Cells reached from `seeds`, each seed `(cell, radius)` growing up to
/// `radius` hops into cells accepted by `passable`. Seeds themselves are
/// always reached.
pub fn grow_layers<V, I, P>(mesh: &V, seeds: I, passable: P) -> Vec<bool>
where
    V: ConnectivityView,
    I: IntoIterator<Item = (CellId, u32)>,
    P: Fn(CellId) -> bool,
{
    let n = mesh.n_cells();
    let mut remaining: Vec<Option<u32>> = vec![None; n];
    let mut buckets: Vec<Vec<CellId>> = Vec::new();

    // no path is longer than n - 1 hops
    let max_radius = u32::try_from(n.saturating_sub(1)).unwrap_or(u32::MAX);
    for (cell, radius) in seeds {
        let radius = radius.min(max_radius);
        let slot = &mut remaining[cell.index()];
        if slot.is_some_and(|r| r >= radius) {
            continue;
        }
        *slot = Some(radius);
        let r = radius as usize;
        if buckets.len() <= r {
            buckets.resize_with(r + 1, Vec::new);
        }
        buckets[r].push(cell);
    }

    for r in (1..buckets.len()).rev() {
        let frontier = std::mem::take(&mut buckets[r]);
        for cell in frontier {
            // superseded by a larger radius reached later
            if remaining[cell.index()] != Some(r as u32) {
                continue;
            }
            for &nb in mesh.cell_neighbors(cell) {
                let next = r as u32 - 1;
                if remaining[nb.index()].is_some_and(|x| x >= next) || !passable(nb) {
                    continue;
                }
                remaining[nb.index()] = Some(next);
                buckets[next as usize].push(nb);
            }
        }
    }

    remaining.into_iter().map(|r| r.is_some()).collect()
}

/// Cells within `hops` face hops of any cell in `mask`, unrestricted.
pub fn within_hops<V: ConnectivityView>(mesh: &V, mask: &[bool], hops: u32) -> Vec<bool> {
    let seeds = mask
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m)
        .map(|(i, _)| (CellId::from_index(i), hops));
    grow_layers(mesh, seeds, |_| true)
}

/// Ids of the set cells of a mask, ascending.
pub fn mask_to_cells(mask: &[bool]) -> Vec<CellId> {
    mask.iter()
        .enumerate()
        .filter(|&(_, &m)| m)
        .map(|(i, _)| CellId::from_index(i))
        .collect()
}
