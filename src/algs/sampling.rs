//! Derived per-cell and per-point quantities used by refinement criteria.
//!
//! Everything here is a pure function of the connectivity view and its input
//! slice. Loops run over cells or points independently, so with the `rayon`
//! feature they are evaluated in parallel; the only reductions are max/sum
//! over a fixed neighbourhood, which do not depend on evaluation order.
//!
//! Gradients use an inverse-distance-squared weighted least-squares fit over
//! the face neighbours of each cell. Directions in which no neighbour offset
//! exists (one-cell-thick slabs, lines) are removed from the normal
//! equations, so 2D and 1D meshes get the gradient of their resolved
//! directions and zero in the others.
//!
//! # Panics
//!
//! Input slices must hold one value per cell (or per point for
//! [`FieldSampler::point_to_cell`]); callers obtain them through
//! [`FieldSet`](crate::data::fields::FieldSet), which checks lengths.

use crate::topology::connectivity::ConnectivityView;
use crate::topology::point::{CellId, PointId};

const DIST_SQ_MIN: f64 = 1e-20;
const PIVOT_MIN: f64 = 1e-12;

/// Evaluate `f` for every index in `0..n`, in parallel with `rayon`.
pub(crate) fn map_indices<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Send + Sync,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        (0..n).map(f).collect()
    }
}

#[inline]
fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn norm(a: [f64; 3]) -> f64 {
    (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt()
}

/// Stencil sampler bound to one mesh snapshot.
#[derive(Clone, Copy, Debug)]
pub struct FieldSampler<'m, V> {
    mesh: &'m V,
}

impl<'m, V: ConnectivityView> FieldSampler<'m, V> {
    /// Bind a sampler to a mesh.
    pub fn new(mesh: &'m V) -> Self {
        Self { mesh }
    }

    /// Per point, the maximum of the incident cells' values.
    ///
    /// Points without incident cells get `-inf`.
    pub fn cell_to_point(&self, cell_values: &[f64]) -> Vec<f64> {
        debug_assert_eq!(cell_values.len(), self.mesh.n_cells());
        map_indices(self.mesh.n_points(), |p| {
            self.mesh
                .point_cells(PointId::from_index(p))
                .iter()
                .map(|c| cell_values[c.index()])
                .fold(f64::NEG_INFINITY, f64::max)
        })
    }

    /// Per point, the mean of the incident cells' values (0 for isolated
    /// points).
    pub fn cell_to_point_mean(&self, cell_values: &[f64]) -> Vec<f64> {
        debug_assert_eq!(cell_values.len(), self.mesh.n_cells());
        map_indices(self.mesh.n_points(), |p| {
            let cells = self.mesh.point_cells(PointId::from_index(p));
            if cells.is_empty() {
                return 0.0;
            }
            cells.iter().map(|c| cell_values[c.index()]).sum::<f64>() / cells.len() as f64
        })
    }

    /// Per cell, the maximum of its points' values.
    ///
    /// Cells without points get `-inf`.
    pub fn point_to_cell(&self, point_values: &[f64]) -> Vec<f64> {
        debug_assert_eq!(point_values.len(), self.mesh.n_points());
        map_indices(self.mesh.n_cells(), |c| {
            self.mesh
                .cell_points(CellId::from_index(c))
                .iter()
                .map(|p| point_values[p.index()])
                .fold(f64::NEG_INFINITY, f64::max)
        })
    }

    /// Cell → point → cell max smoothing: each cell takes the maximum over
    /// every cell it shares a point with.
    pub fn smear(&self, cell_values: &[f64]) -> Vec<f64> {
        self.point_to_cell(&self.cell_to_point(cell_values))
    }

    /// Per cell, the largest absolute difference to a face neighbour.
    pub fn face_jump(&self, values: &[f64]) -> Vec<f64> {
        debug_assert_eq!(values.len(), self.mesh.n_cells());
        map_indices(self.mesh.n_cells(), |c| {
            let v = values[c];
            self.mesh
                .cell_neighbors(CellId::from_index(c))
                .iter()
                .map(|n| (values[n.index()] - v).abs())
                .fold(0.0, f64::max)
        })
    }

    /// Least-squares cell-centre gradient of a scalar field.
    pub fn gradient(&self, values: &[f64]) -> Vec<[f64; 3]> {
        debug_assert_eq!(values.len(), self.mesh.n_cells());
        map_indices(self.mesh.n_cells(), |c| self.cell_gradient(CellId::from_index(c), |i| values[i]))
    }

    /// Magnitude of [`gradient`](Self::gradient).
    pub fn gradient_magnitude(&self, values: &[f64]) -> Vec<f64> {
        self.gradient(values).into_iter().map(norm).collect()
    }

    /// Cell-centre curl of a vector field, assembled from the least-squares
    /// gradients of its components.
    pub fn curl(&self, vectors: &[[f64; 3]]) -> Vec<[f64; 3]> {
        debug_assert_eq!(vectors.len(), self.mesh.n_cells());
        map_indices(self.mesh.n_cells(), |c| {
            let cell = CellId::from_index(c);
            let gu = self.cell_gradient(cell, |i| vectors[i][0]);
            let gv = self.cell_gradient(cell, |i| vectors[i][1]);
            let gw = self.cell_gradient(cell, |i| vectors[i][2]);
            [gw[1] - gv[2], gu[2] - gw[0], gv[0] - gu[1]]
        })
    }

    /// Magnitude of [`curl`](Self::curl).
    pub fn curl_magnitude(&self, vectors: &[[f64; 3]]) -> Vec<f64> {
        self.curl(vectors).into_iter().map(norm).collect()
    }

    fn cell_gradient(&self, cell: CellId, value: impl Fn(usize) -> f64) -> [f64; 3] {
        let xc = self.mesh.cell_centre(cell);
        let phi_c = value(cell.index());
        let mut a = [[0.0f64; 3]; 3];
        let mut b = [0.0f64; 3];
        for &n in self.mesh.cell_neighbors(cell) {
            let d = sub(self.mesh.cell_centre(n), xc);
            let dist_sq = d[0] * d[0] + d[1] * d[1] + d[2] * d[2];
            if dist_sq < DIST_SQ_MIN {
                continue;
            }
            let w = 1.0 / dist_sq;
            let dphi = value(n.index()) - phi_c;
            for r in 0..3 {
                for s in 0..3 {
                    a[r][s] += w * d[r] * d[s];
                }
                b[r] += w * d[r] * dphi;
            }
        }
        solve_normal_equations(a, b).unwrap_or([0.0; 3])
    }
}

/// Solve the symmetric 3×3 normal equations restricted to the directions the
/// stencil actually spans. Returns `None` when the reduced system is singular.
fn solve_normal_equations(a: [[f64; 3]; 3], b: [f64; 3]) -> Option<[f64; 3]> {
    let trace = a[0][0] + a[1][1] + a[2][2];
    if trace <= 0.0 {
        return None;
    }
    let axes: Vec<usize> = (0..3).filter(|&i| a[i][i] > PIVOT_MIN * trace).collect();
    let n = axes.len();

    // augmented reduced system, Gaussian elimination with partial pivoting
    let mut m = [[0.0f64; 4]; 3];
    for (r, &i) in axes.iter().enumerate() {
        for (s, &j) in axes.iter().enumerate() {
            m[r][s] = a[i][j];
        }
        m[r][n] = b[i];
    }
    for col in 0..n {
        let pivot = (col..n).max_by(|&x, &y| m[x][col].abs().total_cmp(&m[y][col].abs()))?;
        if m[pivot][col].abs() < PIVOT_MIN * trace {
            return None;
        }
        m.swap(col, pivot);
        for row in (col + 1)..n {
            let f = m[row][col] / m[col][col];
            for k in col..=n {
                m[row][k] -= f * m[col][k];
            }
        }
    }
    let mut x = [0.0f64; 3];
    for row in (0..n).rev() {
        let mut acc = m[row][n];
        for k in (row + 1)..n {
            acc -= m[row][k] * x[k];
        }
        x[row] = acc / m[row][row];
    }

    let mut out = [0.0f64; 3];
    for (r, &i) in axes.iter().enumerate() {
        out[i] = x[r];
    }
    out.iter().all(|v| v.is_finite()).then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::meshgen::hex_box;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn cell_to_point_takes_max() {
        let mesh = hex_box([2, 1, 1], [2.0, 1.0, 1.0]).unwrap();
        let s = FieldSampler::new(&mesh);
        let pts = s.cell_to_point(&[1.0, 3.0]);
        // x = 0 face only touches cell 0, x = 1 face both, x = 2 face only cell 1
        assert_eq!(pts[0], 1.0);
        assert_eq!(pts[1], 3.0);
        assert_eq!(pts[2], 3.0);
        let mean = s.cell_to_point_mean(&[1.0, 3.0]);
        assert_eq!(mean[1], 2.0);
    }

    #[test]
    fn point_to_cell_takes_max() {
        let mesh = hex_box([2, 1, 1], [2.0, 1.0, 1.0]).unwrap();
        let s = FieldSampler::new(&mesh);
        let mut pts = vec![0.0; mesh.n_points()];
        pts[2] = 5.0; // corner at x = 2, only on cell 1
        assert_eq!(s.point_to_cell(&pts), vec![0.0, 5.0]);
    }

    #[test]
    fn smear_spreads_over_point_neighbourhood() {
        let mesh = hex_box([3, 3, 1], [3.0, 3.0, 1.0]).unwrap();
        let s = FieldSampler::new(&mesh);
        let mut v = vec![0.0; 9];
        v[0] = 1.0;
        let out = s.smear(&v);
        // cell 0 shares points with 1, 3 and 4 (diagonal)
        let touched: Vec<usize> = (0..9).filter(|&i| out[i] == 1.0).collect();
        assert_eq!(touched, vec![0, 1, 3, 4]);
    }

    #[test]
    fn gradient_of_linear_field_is_exact() {
        let mesh = hex_box([3, 3, 3], [3.0, 3.0, 3.0]).unwrap();
        let s = FieldSampler::new(&mesh);
        let phi: Vec<f64> = mesh
            .cells()
            .map(|c| {
                let x = mesh.cell_centre(c);
                2.0 * x[0] + 3.0 * x[1] - x[2]
            })
            .collect();
        for g in s.gradient(&phi) {
            assert!(close(g[0], 2.0) && close(g[1], 3.0) && close(g[2], -1.0), "{g:?}");
        }
        for m in s.gradient_magnitude(&phi) {
            assert!(close(m, 14.0f64.sqrt()));
        }
    }

    #[test]
    fn gradient_on_slab_ignores_unresolved_direction() {
        let mesh = hex_box([4, 4, 1], [4.0, 4.0, 0.5]).unwrap();
        let s = FieldSampler::new(&mesh);
        let phi: Vec<f64> = mesh.cells().map(|c| mesh.cell_centre(c)[0]).collect();
        for g in s.gradient(&phi) {
            assert!(close(g[0], 1.0) && close(g[1], 0.0) && close(g[2], 0.0), "{g:?}");
        }
    }

    #[test]
    fn curl_of_rigid_rotation() {
        let mesh = hex_box([3, 3, 2], [3.0, 3.0, 2.0]).unwrap();
        let s = FieldSampler::new(&mesh);
        let u: Vec<[f64; 3]> = mesh
            .cells()
            .map(|c| {
                let x = mesh.cell_centre(c);
                [-x[1], x[0], 0.0]
            })
            .collect();
        for w in s.curl(&u) {
            assert!(close(w[0], 0.0) && close(w[1], 0.0) && close(w[2], 2.0), "{w:?}");
        }
        assert!(s.curl_magnitude(&u).iter().all(|&m| close(m, 2.0)));
    }

    #[test]
    fn face_jump_sees_interface() {
        let mesh = hex_box([4, 1, 1], [4.0, 1.0, 1.0]).unwrap();
        let s = FieldSampler::new(&mesh);
        assert_eq!(s.face_jump(&[1.0, 1.0, 0.0, 0.0]), vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn isolated_cell_has_zero_gradient() {
        let mesh = hex_box([1, 1, 1], [1.0; 3]).unwrap();
        let s = FieldSampler::new(&mesh);
        assert_eq!(s.gradient(&[4.0]), vec![[0.0; 3]]);
    }
}
