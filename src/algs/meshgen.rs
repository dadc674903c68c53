//! Structured hexahedral box generator.
//!
//! Produces an [`InMemoryMesh`] of `nx × ny × nz` unit-level hexahedra with
//! x-fastest cell numbering (`c = i + nx * (j + ny * k)`) and matching point
//! numbering on the `(nx+1) × (ny+1) × (nz+1)` lattice. Every cell carries its
//! 8 corner points in the usual hexahedron order, so the anchor-point check
//! passes on a freshly generated box.

use crate::mesh_error::AdaptError;
use crate::topology::mesh::InMemoryMesh;
use crate::topology::point::{CellId, PointId};

fn invalid(message: impl Into<String>) -> AdaptError {
    AdaptError::InvalidTopology(message.into())
}

/// Build a box of `dims` cells spanning `lengths`.
///
/// The geometric dimension of the result is the number of axes with more
/// than one cell (at least 1), the way a one-cell-thick slab is treated as a
/// 2D case.
pub fn hex_box(dims: [usize; 3], lengths: [f64; 3]) -> Result<InMemoryMesh, AdaptError> {
    let [nx, ny, nz] = dims;
    if nx == 0 || ny == 0 || nz == 0 {
        return Err(invalid(format!("box dimensions must be non-zero, got {dims:?}")));
    }
    if lengths.iter().any(|l| !(l.is_finite() && *l > 0.0)) {
        return Err(invalid(format!("box lengths must be positive, got {lengths:?}")));
    }
    let n_cells = nx
        .checked_mul(ny)
        .and_then(|n| n.checked_mul(nz))
        .filter(|&n| n <= u32::MAX as usize)
        .ok_or_else(|| invalid(format!("box {dims:?} has too many cells")))?;

    let (px, py) = (nx + 1, ny + 1);
    let point = |i: usize, j: usize, k: usize| PointId::from_index(i + px * (j + py * k));
    let cell = |i: usize, j: usize, k: usize| CellId::from_index(i + nx * (j + ny * k));
    let h = [
        lengths[0] / nx as f64,
        lengths[1] / ny as f64,
        lengths[2] / nz as f64,
    ];

    let mut cell_points = Vec::with_capacity(n_cells);
    let mut neighbors = Vec::with_capacity(n_cells);
    let mut centres = Vec::with_capacity(n_cells);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                cell_points.push(vec![
                    point(i, j, k),
                    point(i + 1, j, k),
                    point(i + 1, j + 1, k),
                    point(i, j + 1, k),
                    point(i, j, k + 1),
                    point(i + 1, j, k + 1),
                    point(i + 1, j + 1, k + 1),
                    point(i, j + 1, k + 1),
                ]);

                let mut nbrs = Vec::with_capacity(6);
                if k > 0 {
                    nbrs.push(cell(i, j, k - 1));
                }
                if j > 0 {
                    nbrs.push(cell(i, j - 1, k));
                }
                if i > 0 {
                    nbrs.push(cell(i - 1, j, k));
                }
                if i + 1 < nx {
                    nbrs.push(cell(i + 1, j, k));
                }
                if j + 1 < ny {
                    nbrs.push(cell(i, j + 1, k));
                }
                if k + 1 < nz {
                    nbrs.push(cell(i, j, k + 1));
                }
                neighbors.push(nbrs);

                centres.push([
                    (i as f64 + 0.5) * h[0],
                    (j as f64 + 0.5) * h[1],
                    (k as f64 + 0.5) * h[2],
                ]);
            }
        }
    }

    let n_points = px * py * (nz + 1);
    let dimension = dims.iter().filter(|&&n| n > 1).count().max(1) as u32;
    Ok(InMemoryMesh::try_new(n_points, cell_points, neighbors, centres)?.with_dimension(dimension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::connectivity::ConnectivityView;
    use crate::topology::mesh::{HEX_FACE_POINTS, face_neighbors_from_shared_points};

    #[test]
    fn counts_and_dimension() {
        let mesh = hex_box([2, 2, 2], [1.0, 1.0, 1.0]).unwrap();
        assert_eq!(mesh.n_cells(), 8);
        assert_eq!(mesh.n_points(), 27);
        assert_eq!(mesh.dimension(), 3);
        let slab = hex_box([4, 4, 1], [1.0, 1.0, 0.1]).unwrap();
        assert_eq!(slab.dimension(), 2);
        let line = hex_box([8, 1, 1], [8.0, 1.0, 1.0]).unwrap();
        assert_eq!(line.dimension(), 1);
    }

    #[test]
    fn neighbors_match_shared_faces() {
        let mesh = hex_box([3, 2, 2], [3.0, 2.0, 2.0]).unwrap();
        let cell_points: Vec<Vec<PointId>> =
            mesh.cells().map(|c| mesh.cell_points(c).to_vec()).collect();
        let derived =
            face_neighbors_from_shared_points(mesh.n_points(), &cell_points, HEX_FACE_POINTS);
        for c in mesh.cells() {
            let mut direct = mesh.cell_neighbors(c).to_vec();
            direct.sort_unstable();
            assert_eq!(direct, derived[c.index()], "cell {c}");
        }
    }

    #[test]
    fn centres_are_cell_midpoints() {
        let mesh = hex_box([2, 1, 1], [2.0, 1.0, 1.0]).unwrap();
        assert_eq!(mesh.cell_centre(CellId::new(1)), [1.5, 0.5, 0.5]);
    }

    #[test]
    fn rejects_empty_box() {
        assert!(hex_box([0, 1, 1], [1.0; 3]).is_err());
        assert!(hex_box([1, 1, 1], [1.0, -1.0, 1.0]).is_err());
    }
}
