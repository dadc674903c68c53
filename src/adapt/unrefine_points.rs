//! Split-point unrefinement selection, for engines that merge cells around
//! the point created when they were split rather than by sibling group.

use crate::topology::connectivity::ConnectivityView;
use crate::topology::point::PointId;

/// Split points whose value is below `unrefine_level` and whose incident
/// cells are all unmarked.
///
/// `marked` is indexed by cell id (typically the refine mask of the step),
/// `point_field` by point id. Returns points in the order of `split_points`.
pub fn select_unrefine_points<V: ConnectivityView>(
    mesh: &V,
    split_points: &[PointId],
    unrefine_level: f64,
    marked: &[bool],
    point_field: &[f64],
) -> Vec<PointId> {
    split_points
        .iter()
        .copied()
        .filter(|&p| {
            point_field[p.index()] < unrefine_level
                && mesh.point_cells(p).iter().all(|c| !marked[c.index()])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::meshgen::hex_box;

    #[test]
    fn below_level_and_unmarked() {
        // 2 x 1 x 1 box: points 1, 4, 7, 10 lie on the shared face
        let mesh = hex_box([2, 1, 1], [2.0, 1.0, 1.0]).unwrap();
        let mut field = vec![1.0; mesh.n_points()];
        field[1] = 0.0;
        field[2] = 0.0;
        let split = [PointId::new(1), PointId::new(2), PointId::new(4)];

        let got = select_unrefine_points(&mesh, &split, 0.5, &[false, false], &field);
        assert_eq!(got, vec![PointId::new(1), PointId::new(2)]);

        // marking cell 0 excludes the shared-face point but not the x = 2 corner
        let got = select_unrefine_points(&mesh, &split, 0.5, &[true, false], &field);
        assert_eq!(got, vec![PointId::new(2)]);
    }
}
