mod util;

use sieve_amr::prelude::*;
use util::*;

#[derive(Default)]
struct RecordingCutter {
    refined: Vec<Vec<CellId>>,
    unrefined: Vec<Vec<CellId>>,
    fail_refine: bool,
}

impl MeshCutter for RecordingCutter {
    type Error = String;

    fn refine(&mut self, cells: &[CellId]) -> Result<(), Self::Error> {
        if self.fail_refine {
            return Err("face split left a non-manifold edge".into());
        }
        self.refined.push(cells.to_vec());
        Ok(())
    }

    fn unrefine(&mut self, cells: &[CellId]) -> Result<(), Self::Error> {
        self.unrefined.push(cells.to_vec());
        Ok(())
    }
}

fn controller(interval: u32) -> RefinementController {
    RefinementController::new(RefinementConfig {
        refine_interval: interval,
        field: Some("alpha".into()),
        n_buffer_layers: 0,
        ..RefinementConfig::default()
    })
    .unwrap()
}

#[test]
fn update_runs_only_on_interval() {
    let mesh = hex_box([4, 1, 1], [4.0, 1.0, 1.0]).unwrap();
    let fields = scalar("alpha", vec![0.0, 0.9, 0.0, 0.0]);
    let mut ctl = controller(2);
    let mut cutter = RecordingCutter::default();

    assert!(ctl.update(1, &mesh, &fields, &mut cutter).unwrap().is_none());
    assert_eq!(ctl.iterations(), 0);

    let d = ctl.update(2, &mesh, &fields, &mut cutter).unwrap().unwrap();
    assert_eq!(d.refine, ids(&[1]));
    assert_eq!(cutter.refined, vec![ids(&[1])]);
    assert!(cutter.unrefined.is_empty());
    assert_eq!(ctl.iterations(), 1);

    ctl.update(4, &mesh, &fields, &mut cutter).unwrap();
    assert_eq!(ctl.iterations(), 2);
}

#[test]
fn empty_decision_still_counts_as_a_step() {
    let mesh = hex_box([4, 1, 1], [4.0, 1.0, 1.0]).unwrap();
    let fields = scalar("alpha", vec![0.0; 4]);
    let mut ctl = controller(1);
    let mut cutter = RecordingCutter::default();
    let d = ctl.update(0, &mesh, &fields, &mut cutter).unwrap().unwrap();
    assert!(d.is_empty());
    assert!(cutter.refined.is_empty());
    assert_eq!(ctl.iterations(), 1);
}

#[test]
fn cutter_failure_is_reported_and_not_counted() {
    let mesh = hex_box([4, 1, 1], [4.0, 1.0, 1.0]).unwrap();
    let fields = scalar("alpha", vec![0.9, 0.9, 0.0, 0.0]);
    let mut ctl = controller(1);
    let mut cutter = RecordingCutter {
        fail_refine: true,
        ..Default::default()
    };
    let err = ctl.update(0, &mesh, &fields, &mut cutter).unwrap_err();
    assert_eq!(
        err,
        AdaptError::Cutter {
            operation: "refine",
            cells: 2,
            reason: "face split left a non-manifold edge".into()
        }
    );
    assert_eq!(ctl.iterations(), 0);
}

#[test]
fn unrefine_goes_to_the_cutter_after_refine() {
    let mesh = hex_box([6, 1, 1], [6.0, 1.0, 1.0])
        .unwrap()
        .with_cell_levels(vec![0, 0, 1, 1, 1, 1])
        .unwrap()
        .with_poolable_groups(vec![ids(&[4, 5])])
        .unwrap();
    let fields = scalar("alpha", vec![0.9, 0.0, 0.0, 0.0, 0.0, 0.0]);
    let mut ctl = RefinementController::new(RefinementConfig {
        field: Some("alpha".into()),
        unrefine_level: Some(0.5),
        n_buffer_layers: 0,
        ..RefinementConfig::default()
    })
    .unwrap();
    let mut cutter = RecordingCutter::default();
    let d = ctl.update(0, &mesh, &fields, &mut cutter).unwrap().unwrap();
    assert_eq!(d.refine, ids(&[0]));
    assert_eq!(d.unrefine, ids(&[4, 5]));
    assert_eq!(cutter.refined, vec![ids(&[0])]);
    assert_eq!(cutter.unrefined, vec![ids(&[4, 5])]);
}

#[test]
fn decide_leaves_counter_alone() {
    let mesh = hex_box([2, 1, 1], [2.0, 1.0, 1.0]).unwrap();
    let ctl = controller(1);
    ctl.decide(&mesh, &scalar("alpha", vec![0.9, 0.0])).unwrap();
    assert_eq!(ctl.iterations(), 0);
    assert!(ctl.flux_corrections().is_empty());
}

/// Splits each refined cell in place into `children` cells, shifting every
/// later id, and maps unrefine ids through that renumbering.
struct RenumberingCutter {
    children: u32,
    shift: Vec<u32>,
    merged: Vec<CellId>,
}

impl MeshCutter for RenumberingCutter {
    type Error = String;

    fn refine(&mut self, cells: &[CellId]) -> Result<(), Self::Error> {
        for (old, s) in self.shift.iter_mut().enumerate() {
            let before = cells.iter().filter(|c| (c.get() as usize) < old).count() as u32;
            *s = before * (self.children - 1);
        }
        Ok(())
    }

    fn unrefine(&mut self, cells: &[CellId]) -> Result<(), Self::Error> {
        self.merged = cells
            .iter()
            .map(|c| CellId::new(c.get() + self.shift[c.get() as usize]))
            .collect();
        Ok(())
    }
}

#[test]
fn unrefine_ids_are_numbered_against_the_snapshot() {
    let mesh = hex_box([6, 1, 1], [6.0, 1.0, 1.0])
        .unwrap()
        .with_cell_levels(vec![0, 0, 1, 1, 1, 1])
        .unwrap()
        .with_poolable_groups(vec![ids(&[4, 5])])
        .unwrap();
    let fields = scalar("alpha", vec![0.9, 0.0, 0.0, 0.0, 0.0, 0.0]);
    let mut ctl = RefinementController::new(RefinementConfig {
        field: Some("alpha".into()),
        unrefine_level: Some(0.5),
        n_buffer_layers: 0,
        ..RefinementConfig::default()
    })
    .unwrap();
    let mut cutter = RenumberingCutter {
        children: 2,
        shift: vec![0; 6],
        merged: Vec::new(),
    };
    let d = ctl.update(0, &mesh, &fields, &mut cutter).unwrap().unwrap();
    assert_eq!(d.refine, ids(&[0]));
    // the decision keeps snapshot ids; the engine's own map moves them by one
    assert_eq!(d.unrefine, ids(&[4, 5]));
    assert_eq!(cutter.merged, ids(&[5, 6]));
}
