//! Buffer layers, protection filtering, 2:1 closure and the final budget
//! clamp for refinement; group and balance filtering for unrefinement.
//!
//! The refine set is grown from the seeds by face layers, clipped at the
//! maximum depth and by the protection mask, and then closed under the
//! balance rule: every face neighbour coarser than a selected cell is
//! selected as well. Protection spreads to finer neighbours, so the closure
//! never needs a protected cell.
//!
//! The size of the closed set only grows with the seed list, so the budget
//! clamp binary-searches the longest seed prefix that fits.

use std::collections::VecDeque;

use crate::adapt::combine::TargetLevels;
use crate::adapt::protect::ProtectedCells;
use crate::algs::layers::{grow_layers, mask_to_cells, within_hops};
use crate::config::RefinementConfig;
use crate::topology::connectivity::ConnectivityView;
use crate::topology::point::{CellId, Level};
use crate::topology::validation::projected_levels;

/// Final lists of one step plus what the pass dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferedSelection {
    /// Cells to refine, ascending.
    pub refine: Vec<CellId>,
    /// Cells to unrefine, ascending.
    pub unrefine: Vec<CellId>,
    /// Buffered cells removed because they are protected.
    pub dropped_protected: usize,
    /// Seeds dropped to keep the buffered set inside the budget.
    pub dropped_budget: usize,
    /// Poolable groups dropped to keep 2:1 balance.
    pub dropped_pools: usize,
}

struct Expansion {
    mask: Vec<bool>,
    len: usize,
    dropped_protected: usize,
}

fn expand<V: ConnectivityView>(
    mesh: &V,
    seeds: &[CellId],
    targets: &TargetLevels,
    protected: &ProtectedCells,
    n_buffer_layers: u32,
    max_refinement: Level,
) -> Expansion {
    let reached = grow_layers(
        mesh,
        seeds
            .iter()
            .map(|&c| (c, n_buffer_layers.max(targets.add_layers[c.index()]))),
        |_| true,
    );

    let mut mask = vec![false; mesh.n_cells()];
    let mut dropped_protected = 0;
    let mut queue = VecDeque::new();
    for c in mask_to_cells(&reached) {
        if mesh.cell_level(c) >= max_refinement {
            continue;
        }
        if protected.contains(c) {
            dropped_protected += 1;
            continue;
        }
        mask[c.index()] = true;
        queue.push_back(c);
    }

    while let Some(c) = queue.pop_front() {
        let level = mesh.cell_level(c);
        for &nb in mesh.cell_neighbors(c) {
            if !mask[nb.index()] && mesh.cell_level(nb) < level && !protected.contains(nb) {
                mask[nb.index()] = true;
                queue.push_back(nb);
            }
        }
    }

    let len = mask.iter().filter(|&&m| m).count();
    Expansion {
        mask,
        len,
        dropped_protected,
    }
}

/// Largest `k` such that `fits(k)` holds, for a predicate true at 0 and
/// monotone decreasing in `k`.
fn longest_fitting_prefix(n: usize, fits: impl Fn(usize) -> bool) -> usize {
    let (mut lo, mut hi) = (0usize, n);
    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Turn the selector's candidates into the final refine/unrefine lists.
///
/// `seeds` must be in priority order; `allowance` bounds the final refine
/// count.
pub fn buffer_and_protect<V: ConnectivityView>(
    mesh: &V,
    seeds: &[CellId],
    unrefine_candidates: &[CellId],
    targets: &TargetLevels,
    protected: &ProtectedCells,
    config: &RefinementConfig,
    allowance: usize,
) -> BufferedSelection {
    let run = |k: usize| {
        expand(
            mesh,
            &seeds[..k],
            targets,
            protected,
            config.n_buffer_layers,
            config.max_refinement,
        )
    };

    let mut expansion = run(seeds.len());
    let mut kept = seeds.len();
    if expansion.len > allowance {
        kept = longest_fitting_prefix(seeds.len(), |k| run(k).len <= allowance);
        expansion = run(kept);
        log::debug!(
            "buffered refinement of {} cells exceeds the allowance of {allowance}; keeping {kept} of {} seeds",
            expansion.len,
            seeds.len()
        );
    }

    let refine = mask_to_cells(&expansion.mask);
    let (unrefine, dropped_pools) =
        filter_unrefinement(mesh, &expansion.mask, &refine, unrefine_candidates, protected, config);

    BufferedSelection {
        refine,
        unrefine,
        dropped_protected: expansion.dropped_protected,
        dropped_budget: seeds.len() - kept,
        dropped_pools,
    }
}

fn filter_unrefinement<V: ConnectivityView>(
    mesh: &V,
    refine_mask: &[bool],
    refine: &[CellId],
    candidates: &[CellId],
    protected: &ProtectedCells,
    config: &RefinementConfig,
) -> (Vec<CellId>, usize) {
    if candidates.is_empty() {
        return (Vec::new(), 0);
    }
    let near_refine = within_hops(mesh, refine_mask, config.n_buffer_layers);
    let mut eligible = vec![false; mesh.n_cells()];
    for &c in candidates {
        eligible[c.index()] = !near_refine[c.index()] && !protected.contains(c);
    }

    let mut pools: Vec<&[CellId]> = mesh
        .poolable_groups()
        .iter()
        .filter(|g| !g.is_empty() && g.iter().all(|c| eligible[c.index()]))
        .map(Vec::as_slice)
        .collect();

    let mut dropped = 0;
    loop {
        let unrefine: Vec<CellId> = pools.iter().flat_map(|g| g.iter().copied()).collect();
        let levels = projected_levels(mesh, refine, &unrefine);
        let before = pools.len();
        pools.retain(|g| {
            g.iter().all(|&c| {
                mesh.cell_neighbors(c)
                    .iter()
                    .all(|n| levels[c.index()].abs_diff(levels[n.index()]) <= 1)
            })
        });
        dropped += before - pools.len();
        if pools.len() == before {
            let mut out = unrefine;
            out.sort_unstable();
            out.dedup();
            return (out, dropped);
        }
    }
}
