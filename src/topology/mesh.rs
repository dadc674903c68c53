//! In-memory CSR mesh implementing [`ConnectivityView`].
//!
//! Built from cell → point lists; point → cell incidence is derived by
//! transposition. Face neighbours are either supplied or derived from shared
//! points, the same shared-boundary counting used for dual graphs.

use std::collections::HashMap;

use crate::mesh_error::AdaptError;
use crate::topology::connectivity::{CellGroup, ConnectivityView};
use crate::topology::csr::Csr;
use crate::topology::point::{CellId, Level, PointId};
use crate::topology::validation::DebugInvariants;

/// Number of points two hexahedra share across a conforming face.
pub const HEX_FACE_POINTS: usize = 4;

/// Snapshot of an unstructured mesh held in CSR tables.
#[derive(Debug, Clone)]
pub struct InMemoryMesh {
    cell_points: Csr<PointId>,
    point_cells: Csr<CellId>,
    neighbors: Csr<CellId>,
    cell_level: Vec<Level>,
    point_level: Vec<Level>,
    centres: Vec<[f64; 3]>,
    pinned: Vec<bool>,
    groups: Vec<CellGroup>,
    dimension: u32,
}

impl InMemoryMesh {
    /// Build a mesh from cell → point lists, face neighbour lists and cell
    /// centres. All levels start at 0.
    pub fn try_new(
        n_points: usize,
        cell_points: Vec<Vec<PointId>>,
        neighbors: Vec<Vec<CellId>>,
        centres: Vec<[f64; 3]>,
    ) -> Result<Self, AdaptError> {
        let n_cells = cell_points.len();
        if neighbors.len() != n_cells || centres.len() != n_cells {
            return Err(AdaptError::InvalidTopology(format!(
                "{n_cells} cells but {} neighbour lists and {} centres",
                neighbors.len(),
                centres.len()
            )));
        }
        for (c, points) in cell_points.iter().enumerate() {
            if let Some(p) = points.iter().find(|p| p.index() >= n_points) {
                return Err(AdaptError::InvalidTopology(format!(
                    "cell {c} references point {p} but the mesh has {n_points} points"
                )));
            }
        }
        for (c, nbrs) in neighbors.iter().enumerate() {
            for n in nbrs {
                if n.index() >= n_cells {
                    return Err(AdaptError::InvalidTopology(format!(
                        "cell {c} references neighbour {n} but the mesh has {n_cells} cells"
                    )));
                }
                if n.index() == c {
                    return Err(AdaptError::InvalidTopology(format!(
                        "cell {c} lists itself as a neighbour"
                    )));
                }
                if !neighbors[n.index()].contains(&CellId::from_index(c)) {
                    return Err(AdaptError::InvalidTopology(format!(
                        "face adjacency is not symmetric: {c} -> {n}"
                    )));
                }
            }
        }

        let cell_points = Csr::from_rows(cell_points);
        let point_cells = cell_points.transpose(n_points, PointId::index, CellId::from_index);
        let mesh = Self {
            cell_points,
            point_cells,
            neighbors: Csr::from_rows(neighbors),
            cell_level: vec![0; n_cells],
            point_level: vec![0; n_points],
            centres,
            pinned: vec![false; n_cells],
            groups: Vec::new(),
            dimension: 3,
        };
        crate::check_invariants!(mesh.validate_invariants(), "InMemoryMesh::try_new");
        Ok(mesh)
    }

    /// Build a mesh whose face neighbours are the cells sharing at least
    /// `shared_points` points (4 for hexahedra).
    pub fn from_shared_points(
        n_points: usize,
        cell_points: Vec<Vec<PointId>>,
        centres: Vec<[f64; 3]>,
        shared_points: usize,
    ) -> Result<Self, AdaptError> {
        let neighbors = face_neighbors_from_shared_points(n_points, &cell_points, shared_points);
        Self::try_new(n_points, cell_points, neighbors, centres)
    }

    /// Replace the cell and point level fields.
    pub fn with_levels(
        mut self,
        cell_level: Vec<Level>,
        point_level: Vec<Level>,
    ) -> Result<Self, AdaptError> {
        if cell_level.len() != self.cell_level.len() || point_level.len() != self.point_level.len()
        {
            return Err(AdaptError::InvalidTopology(format!(
                "level fields sized {}/{} for {} cells and {} points",
                cell_level.len(),
                point_level.len(),
                self.cell_level.len(),
                self.point_level.len()
            )));
        }
        self.cell_level = cell_level;
        self.point_level = point_level;
        Ok(self)
    }

    /// Replace only the cell level field.
    pub fn with_cell_levels(self, cell_level: Vec<Level>) -> Result<Self, AdaptError> {
        let point_level = self.point_level.clone();
        self.with_levels(cell_level, point_level)
    }

    /// Set the level of a single point.
    pub fn set_point_level(&mut self, point: PointId, level: Level) {
        self.point_level[point.index()] = level;
    }

    /// Pin cells as non-refinable.
    pub fn with_pinned(mut self, cells: impl IntoIterator<Item = CellId>) -> Self {
        for c in cells {
            if let Some(flag) = self.pinned.get_mut(c.index()) {
                *flag = true;
            }
        }
        self
    }

    /// Attach the engine's poolable sibling groups.
    pub fn with_poolable_groups(mut self, groups: Vec<CellGroup>) -> Result<Self, AdaptError> {
        let n_cells = self.cell_level.len();
        for group in &groups {
            if let Some(c) = group.iter().find(|c| c.index() >= n_cells) {
                return Err(AdaptError::InvalidTopology(format!(
                    "poolable group references cell {c} but the mesh has {n_cells} cells"
                )));
            }
        }
        self.groups = groups;
        Ok(self)
    }

    /// Override the geometric dimension (defaults to 3).
    pub fn with_dimension(mut self, dimension: u32) -> Self {
        self.dimension = dimension.clamp(1, 3);
        self
    }
}

impl ConnectivityView for InMemoryMesh {
    fn n_cells(&self) -> usize {
        self.cell_level.len()
    }

    fn n_points(&self) -> usize {
        self.point_level.len()
    }

    fn cell_points(&self, cell: CellId) -> &[PointId] {
        self.cell_points.row(cell.index())
    }

    fn point_cells(&self, point: PointId) -> &[CellId] {
        self.point_cells.row(point.index())
    }

    fn cell_neighbors(&self, cell: CellId) -> &[CellId] {
        self.neighbors.row(cell.index())
    }

    fn cell_level(&self, cell: CellId) -> Level {
        self.cell_level[cell.index()]
    }

    fn point_level(&self, point: PointId) -> Level {
        self.point_level[point.index()]
    }

    fn cell_centre(&self, cell: CellId) -> [f64; 3] {
        self.centres[cell.index()]
    }

    fn dimension(&self) -> u32 {
        self.dimension
    }

    fn is_pinned(&self, cell: CellId) -> bool {
        self.pinned[cell.index()]
    }

    fn poolable_groups(&self) -> &[CellGroup] {
        &self.groups
    }

    fn cell_levels(&self) -> Vec<Level> {
        self.cell_level.clone()
    }
}

impl DebugInvariants for InMemoryMesh {
    fn debug_assert_invariants(&self) {
        crate::check_invariants!(self.validate_invariants(), "InMemoryMesh");
    }

    fn validate_invariants(&self) -> Result<(), AdaptError> {
        let n_cells = self.cell_level.len();
        if self.cell_points.n_rows() != n_cells || self.neighbors.n_rows() != n_cells {
            return Err(AdaptError::InvalidTopology(
                "cell tables disagree on the cell count".into(),
            ));
        }
        if self.point_cells.n_rows() != self.point_level.len() {
            return Err(AdaptError::InvalidTopology(
                "point tables disagree on the point count".into(),
            ));
        }
        if self.point_cells.n_values() != self.cell_points.n_values() {
            return Err(AdaptError::InvalidTopology(
                "point -> cell incidence is not the transpose of cell -> point".into(),
            ));
        }
        Ok(())
    }
}

/// Derive face adjacency from point sharing: two cells are neighbours when
/// they share at least `shared_points` points. Neighbour lists are sorted.
pub fn face_neighbors_from_shared_points(
    n_points: usize,
    cell_points: &[Vec<PointId>],
    shared_points: usize,
) -> Vec<Vec<CellId>> {
    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); n_points];
    for (c, points) in cell_points.iter().enumerate() {
        for p in points {
            if let Some(cells) = incident.get_mut(p.index()) {
                cells.push(c);
            }
        }
    }

    let mut shared: Vec<HashMap<usize, usize>> = vec![HashMap::new(); cell_points.len()];
    for mut cells in incident {
        cells.sort_unstable();
        cells.dedup();
        for i in 0..cells.len() {
            for &other in &cells[(i + 1)..] {
                *shared[cells[i]].entry(other).or_insert(0) += 1;
                *shared[other].entry(cells[i]).or_insert(0) += 1;
            }
        }
    }

    shared
        .into_iter()
        .map(|counts| {
            let mut nbrs: Vec<CellId> = counts
                .into_iter()
                .filter(|&(_, n)| n >= shared_points)
                .map(|(c, _)| CellId::from_index(c))
                .collect();
            nbrs.sort_unstable();
            nbrs
        })
        .collect()
}
