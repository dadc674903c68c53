//! Protected cells: cells that must not be refined this step.
//!
//! A hexahedron refined by the cutting engine has exactly eight *anchor*
//! points, the points whose level is not finer than the cell's own level.
//! Cells that fail that count (prisms, split faces left from an earlier
//! step, degenerate hexes) are protected, as are cells the caller pins.
//! Protection then spreads to finer face neighbours: refining a cell next to
//! a coarser protected one would open a second level jump across the face.

use std::collections::VecDeque;

use crate::mesh_error::AdaptError;
use crate::topology::connectivity::ConnectivityView;
use crate::topology::point::CellId;

/// Anchor points of a refinable hexahedron.
pub const ANCHOR_POINTS: usize = 8;

/// Points of `cell` whose level does not exceed the cell's level.
pub fn anchor_point_count<V: ConnectivityView>(mesh: &V, cell: CellId) -> usize {
    let level = mesh.cell_level(cell);
    mesh.cell_points(cell)
        .iter()
        .filter(|&&p| mesh.point_level(p) <= level)
        .count()
}

/// Protection mask for one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedCells {
    mask: Vec<bool>,
    anchor_failures: usize,
    pinned: usize,
    propagated: usize,
}

impl ProtectedCells {
    /// Anchor check, pinning and propagation.
    ///
    /// Propagation runs as breadth-first generations; more than `sweep_cap`
    /// generations (default `n_cells + 1`) is an error.
    pub fn compute<V: ConnectivityView>(mesh: &V, sweep_cap: Option<usize>) -> Result<Self, AdaptError> {
        let n = mesh.n_cells();
        let mut out = Self {
            mask: vec![false; n],
            ..Self::default()
        };
        let mut frontier = VecDeque::new();
        for c in mesh.cells() {
            let pinned = mesh.is_pinned(c);
            let anchors = anchor_point_count(mesh, c);
            let broken = anchors != ANCHOR_POINTS;
            if broken {
                out.anchor_failures += 1;
                log::trace!("cell {c} has {anchors} anchor points");
            }
            if pinned {
                out.pinned += 1;
            }
            if pinned || broken {
                out.mask[c.index()] = true;
                frontier.push_back(c);
            }
        }

        let cap = sweep_cap.unwrap_or(n + 1);
        let mut generation = 0usize;
        while !frontier.is_empty() {
            generation += 1;
            if generation > cap {
                return Err(AdaptError::ProtectionDidNotConverge { cap });
            }
            for _ in 0..frontier.len() {
                let Some(c) = frontier.pop_front() else {
                    break;
                };
                let level = mesh.cell_level(c);
                for &nb in mesh.cell_neighbors(c) {
                    if !out.mask[nb.index()] && mesh.cell_level(nb) > level {
                        out.mask[nb.index()] = true;
                        out.propagated += 1;
                        frontier.push_back(nb);
                    }
                }
            }
        }

        if out.anchor_failures > 0 {
            log::debug!(
                "{} cells fail the {ANCHOR_POINTS}-anchor check, {} protected after propagation",
                out.anchor_failures,
                out.len()
            );
        }
        Ok(out)
    }

    /// `true` when `cell` must not be refined.
    #[inline]
    pub fn contains(&self, cell: CellId) -> bool {
        self.mask[cell.index()]
    }

    /// Number of protected cells.
    pub fn len(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// `true` when nothing is protected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cells that failed the anchor-point check.
    pub fn anchor_failures(&self) -> usize {
        self.anchor_failures
    }

    /// Cells pinned by the caller.
    pub fn pinned(&self) -> usize {
        self.pinned
    }

    /// Cells protected only through propagation.
    pub fn propagated(&self) -> usize {
        self.propagated
    }
}
