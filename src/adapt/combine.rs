//! Combine criterion requests into one target level per cell.

use crate::adapt::criteria::CriterionEvaluator;
use crate::topology::connectivity::ConnectivityView;
use crate::topology::point::Level;

/// Per-cell combination of all criteria for one step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetLevels {
    /// Highest level requested by an active criterion, else the current level.
    pub target: Vec<Level>,
    /// `target - level`.
    pub delta: Vec<i32>,
    /// Any criterion active.
    pub active: Vec<bool>,
    /// Largest `nAddLayers` among the active criteria.
    pub add_layers: Vec<u32>,
}

impl TargetLevels {
    fn from_current<V: ConnectivityView>(mesh: &V) -> Self {
        let n = mesh.n_cells();
        Self {
            target: mesh.cell_levels(),
            delta: vec![0; n],
            active: vec![false; n],
            add_layers: vec![0; n],
        }
    }

    fn finish<V: ConnectivityView>(mut self, mesh: &V) -> Self {
        for c in mesh.cells() {
            let i = c.index();
            self.delta[i] = i32::from(self.target[i]) - i32::from(mesh.cell_level(c));
        }
        self
    }

    /// Number of cells with `delta > 0`.
    pub fn n_requesting_refinement(&self) -> usize {
        self.delta.iter().filter(|&&d| d > 0).count()
    }
}

/// Max-combine a set of bound criteria.
///
/// The result does not depend on the order of `evaluators`.
pub fn combine<V: ConnectivityView>(mesh: &V, evaluators: &[CriterionEvaluator<'_>]) -> TargetLevels {
    let mut out = TargetLevels::from_current(mesh);
    let mut seen = vec![false; mesh.n_cells()];
    for ev in evaluators {
        let layers = ev.criterion().n_add_layers();
        for c in mesh.cells() {
            let Some(level) = ev.evaluate(c) else {
                continue;
            };
            let i = c.index();
            out.target[i] = if seen[i] { out.target[i].max(level) } else { level };
            seen[i] = true;
            out.active[i] = true;
            out.add_layers[i] = out.add_layers[i].max(layers);
        }
    }
    out.finish(mesh)
}

/// Single-field mode: cells whose value lies in `[lower, upper]` request one
/// level more than they have.
pub fn plain_band<V: ConnectivityView>(
    mesh: &V,
    values: &[f64],
    lower: f64,
    upper: f64,
) -> TargetLevels {
    let mut out = TargetLevels::from_current(mesh);
    for c in mesh.cells() {
        let i = c.index();
        if (lower..=upper).contains(&values[i]) {
            out.target[i] = out.target[i].saturating_add(1);
            out.active[i] = true;
        }
    }
    out.finish(mesh)
}
