//! Raw refine/unrefine candidates and the cell budget.
//!
//! Candidates come from thresholding a selection field: the combined level
//! delta when criteria are enabled, the primary field in single-field mode.
//! The refine list is then cut to what the cell budget allows, coarsest
//! levels first and the strongest requests within a level first.

use std::cmp::Reverse;

use itertools::Itertools;

use crate::adapt::combine::TargetLevels;
use crate::algs::sampling::FieldSampler;
use crate::config::{CeilingRounding, RefinementConfig};
use crate::topology::connectivity::ConnectivityView;
use crate::topology::point::{CellId, Level};

/// Candidates before buffering and protection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidates {
    /// Refinement seeds, in priority order.
    pub refine: Vec<CellId>,
    /// Unrefinement candidates, ascending.
    pub unrefine: Vec<CellId>,
    /// Number of cells that may still be split.
    pub allowance: usize,
    /// Refine candidates before the depth and budget cuts.
    pub requested: usize,
    /// Candidates dropped because they are already at maximum depth.
    pub dropped_depth: usize,
    /// Candidates dropped by the budget.
    pub dropped_budget: usize,
    /// Finest level admitted by the budget, when the budget was binding.
    pub level_ceiling: Option<Level>,
}

/// The field candidates are thresholded on.
///
/// `primary` is the single-field-mode field; with `None` the level delta is
/// used. With `point_smoothing` the field is max-smeared through the points.
pub fn selection_field<V: ConnectivityView>(
    mesh: &V,
    targets: &TargetLevels,
    primary: Option<&[f64]>,
    point_smoothing: bool,
) -> Vec<f64> {
    let raw: Vec<f64> = match primary {
        Some(values) => values.to_vec(),
        None => targets.delta.iter().map(|&d| f64::from(d)).collect(),
    };
    if point_smoothing {
        FieldSampler::new(mesh).smear(&raw)
    } else {
        raw
    }
}

/// Cells that may be split without exceeding `max_cells`, when each split
/// turns one cell into `children`.
pub fn refine_allowance(n_cells: usize, max_cells: usize, children: usize) -> usize {
    max_cells.saturating_sub(n_cells) / children.saturating_sub(1).max(1)
}

/// Finest level admitted when `levels` (one per candidate) do not fit
/// `allowance`. Levels are admitted coarsest first; `None` when everything
/// fits.
pub fn level_ceiling(levels: &[Level], allowance: usize, rounding: CeilingRounding) -> Option<Level> {
    if levels.len() <= allowance {
        return None;
    }
    let histogram = levels.iter().copied().counts();
    let mut cumulative = 0usize;
    let mut previous: Option<Level> = None;
    for level in histogram.keys().copied().sorted_unstable() {
        cumulative += histogram[&level];
        if cumulative > allowance {
            return Some(match (rounding, previous) {
                (CeilingRounding::Down, Some(p)) => p,
                _ => level,
            });
        }
        previous = Some(level);
    }
    previous
}

/// Sort cells by refinement priority: largest delta, then lowest level, then
/// lowest id.
pub fn sort_by_priority<V: ConnectivityView>(mesh: &V, targets: &TargetLevels, cells: &mut [CellId]) {
    cells.sort_unstable_by_key(|&c| (Reverse(targets.delta[c.index()]), mesh.cell_level(c), c));
}

/// Threshold the selection field and apply the depth and budget limits.
pub fn select_candidates<V: ConnectivityView>(
    mesh: &V,
    targets: &TargetLevels,
    selection: &[f64],
    config: &RefinementConfig,
) -> Candidates {
    let lower = config.lower_refine_level;
    let upper = config.upper_refine_level;

    let requested: Vec<CellId> = mesh
        .cells()
        .filter(|c| targets.delta[c.index()] > 0 && (lower..=upper).contains(&selection[c.index()]))
        .collect();
    let (mut refine, too_deep): (Vec<CellId>, Vec<CellId>) = requested
        .iter()
        .partition(|&&c| mesh.cell_level(c) < config.max_refinement);

    let unrefine = match config.unrefine_level {
        Some(threshold) => {
            let smeared = FieldSampler::new(mesh).smear(selection);
            let mut is_refine = vec![false; mesh.n_cells()];
            for c in &refine {
                is_refine[c.index()] = true;
            }
            mesh.cells()
                .filter(|&c| {
                    let i = c.index();
                    smeared[i] < threshold
                        && mesh.cell_level(c) > 0
                        && !targets.active[i]
                        && !is_refine[i]
                })
                .collect()
        }
        None => Vec::new(),
    };

    let children = config.children_per_split(mesh.dimension());
    let allowance = refine_allowance(mesh.n_cells(), config.max_cells, children);
    let before_budget = refine.len();

    let levels: Vec<Level> = refine.iter().map(|&c| mesh.cell_level(c)).collect();
    let ceiling = level_ceiling(&levels, allowance, config.budget.ceiling_rounding);
    if let Some(max_level) = ceiling {
        refine.retain(|&c| mesh.cell_level(c) <= max_level);
        log::debug!(
            "budget admits {allowance} splits for {before_budget} candidates, level ceiling {max_level}"
        );
    }
    sort_by_priority(mesh, targets, &mut refine);
    refine.truncate(allowance);

    Candidates {
        dropped_budget: before_budget - refine.len(),
        refine,
        unrefine,
        allowance,
        requested: requested.len(),
        dropped_depth: too_deep.len(),
        level_ceiling: ceiling,
    }
}
