//! Read-only connectivity view of the mesh owned by the mesh-cutting engine.
//!
//! The selection algorithms only ever read the mesh through this trait:
//! cell → point incidence, point → cell incidence, cell → cell face
//! adjacency, and the refinement levels of cells and points. Ids are dense
//! indices (`0..n_cells()`, `0..n_points()`).

use crate::topology::point::{CellId, Level, PointId};

/// Cells that the engine can merge back into one parent when all of them are
/// unrefined together.
pub type CellGroup = Vec<CellId>;

/// Read-only adapter over a mesh snapshot.
///
/// Implementations must be consistent for the lifetime of a step: face
/// adjacency symmetric, `point_cells` the transpose of `cell_points`.
pub trait ConnectivityView: Sync {
    /// Number of cells.
    fn n_cells(&self) -> usize;

    /// Number of points (mesh vertices).
    fn n_points(&self) -> usize;

    /// Points of a cell.
    fn cell_points(&self, cell: CellId) -> &[PointId];

    /// Cells incident to a point.
    fn point_cells(&self, point: PointId) -> &[CellId];

    /// Face neighbours of a cell.
    fn cell_neighbors(&self, cell: CellId) -> &[CellId];

    /// Current refinement level of a cell.
    fn cell_level(&self, cell: CellId) -> Level;

    /// Refinement level at which a point was created.
    fn point_level(&self, point: PointId) -> Level;

    /// Cell centre coordinates.
    fn cell_centre(&self, cell: CellId) -> [f64; 3];

    /// Number of geometric directions the mesh resolves (1, 2 or 3).
    fn dimension(&self) -> u32 {
        3
    }

    /// Cells pinned by the caller as never refinable (e.g. non-hexahedra).
    fn is_pinned(&self, _cell: CellId) -> bool {
        false
    }

    /// Groups of sibling cells that can be merged into one parent.
    fn poolable_groups(&self) -> &[CellGroup] {
        &[]
    }

    /// All cell ids in ascending order.
    fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        (0..self.n_cells()).map(CellId::from_index)
    }

    /// All point ids in ascending order.
    fn points(&self) -> impl Iterator<Item = PointId> + '_ {
        (0..self.n_points()).map(PointId::from_index)
    }

    /// Levels of all cells, indexed by cell id.
    fn cell_levels(&self) -> Vec<Level> {
        self.cells().map(|c| self.cell_level(c)).collect()
    }
}
