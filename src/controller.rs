//! Caller-owned refinement controller.
//!
//! Holds the configuration and the count of completed adaptation steps, and
//! drives a [`MeshCutter`] with the lists [`decide`] produces. The cutting
//! engine itself lives outside this crate.

use std::collections::BTreeMap;
use std::fmt;

use crate::adapt::{RefinementDecision, decide};
use crate::config::{FluxCorrection, RefinementConfig};
use crate::data::fields::FieldSet;
use crate::mesh_error::{AdaptError, ConfigError};
use crate::topology::connectivity::ConnectivityView;
use crate::topology::point::CellId;

/// The mesh-cutting engine that executes a decision.
///
/// Both lists of a step are numbered against the mesh snapshot the decision
/// was made on. [`RefinementController::update`] calls `refine` first, so an
/// engine that renumbers cells while splitting must map the ids passed to
/// `unrefine` through its own refinement map.
pub trait MeshCutter {
    /// Engine failure.
    type Error: fmt::Display;

    /// Split every listed cell.
    fn refine(&mut self, cells: &[CellId]) -> Result<(), Self::Error>;

    /// Merge every listed cell back into its parent.
    ///
    /// Ids refer to the pre-step snapshot, not to the mesh left by the
    /// `refine` call of the same step.
    fn unrefine(&mut self, cells: &[CellId]) -> Result<(), Self::Error>;
}

fn cutter_error<E: fmt::Display>(operation: &'static str, cells: usize, e: E) -> AdaptError {
    AdaptError::Cutter {
        operation,
        cells,
        reason: e.to_string(),
    }
}

/// Adaptation driver for one dynamic mesh.
#[derive(Debug, Clone)]
pub struct RefinementController {
    config: RefinementConfig,
    n_refinement_iterations: u64,
}

impl RefinementController {
    /// Validate `config` and build a controller with a zero iteration count.
    pub fn new(config: RefinementConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            n_refinement_iterations: 0,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &RefinementConfig {
        &self.config
    }

    /// Completed adaptation steps.
    pub fn iterations(&self) -> u64 {
        self.n_refinement_iterations
    }

    /// `true` when `time_index` falls on the refinement interval.
    pub fn is_due(&self, time_index: u64) -> bool {
        time_index % u64::from(self.config.refine_interval) == 0
    }

    /// Flux names and how the engine should correct them after a change.
    pub fn flux_corrections(&self) -> &BTreeMap<String, FluxCorrection> {
        &self.config.correct_fluxes
    }

    /// Decide without touching the mesh or the iteration count.
    pub fn decide<V: ConnectivityView>(
        &self,
        mesh: &V,
        fields: &FieldSet,
    ) -> Result<RefinementDecision, AdaptError> {
        decide(mesh, fields, &self.config)
    }

    /// Run one step if `time_index` is due: decide, refine, then unrefine.
    ///
    /// Returns `Ok(None)` when the step is not due. The iteration count only
    /// advances when the cutter accepted both lists.
    pub fn update<V, C>(
        &mut self,
        time_index: u64,
        mesh: &V,
        fields: &FieldSet,
        cutter: &mut C,
    ) -> Result<Option<RefinementDecision>, AdaptError>
    where
        V: ConnectivityView,
        C: MeshCutter,
    {
        if !self.is_due(time_index) {
            return Ok(None);
        }
        let decision = self.decide(mesh, fields)?;
        if !decision.refine.is_empty() {
            cutter
                .refine(&decision.refine)
                .map_err(|e| cutter_error("refine", decision.refine.len(), e))?;
        }
        if !decision.unrefine.is_empty() {
            cutter
                .unrefine(&decision.unrefine)
                .map_err(|e| cutter_error("unrefine", decision.unrefine.len(), e))?;
        }
        self.n_refinement_iterations += 1;
        log::debug!(
            "refinement iteration {} at time index {time_index}: {} refined, {} unrefined",
            self.n_refinement_iterations,
            decision.refine.len(),
            decision.unrefine.len()
        );
        Ok(Some(decision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval() {
        let ctl = RefinementController::new(RefinementConfig {
            field: Some("alpha".into()),
            refine_interval: 3,
            ..Default::default()
        })
        .unwrap();
        assert!(ctl.is_due(0));
        assert!(!ctl.is_due(1));
        assert!(ctl.is_due(6));
        assert_eq!(ctl.iterations(), 0);
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(RefinementController::new(RefinementConfig::default()).is_err());
    }
}
