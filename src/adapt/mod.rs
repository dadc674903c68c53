//! Refinement decisions for one adaptation step.
//!
//! [`decide`] runs the whole selection pipeline on an immutable mesh
//! snapshot:
//!
//! 1. look up the fields the configuration references,
//! 2. bind every criterion to the snapshot,
//! 3. combine them into target levels,
//! 4. threshold into raw candidates under the depth and budget limits,
//! 5. protect, buffer, close for 2:1 balance and clamp to the budget.
//!
//! Nothing is mutated and any error aborts the step; the caller hands the
//! resulting lists to its mesh-cutting engine.

pub mod buffer;
pub mod combine;
pub mod criteria;
pub mod protect;
pub mod select;
pub mod unrefine_points;

use std::borrow::Cow;
use std::fmt;

use itertools::Itertools;

use crate::config::RefinementConfig;
use crate::data::fields::FieldSet;
use crate::mesh_error::AdaptError;
use crate::topology::connectivity::ConnectivityView;
use crate::topology::point::{CellId, Level};
use crate::topology::validation::{BalanceHandling, check_balance, projected_levels};

use self::buffer::buffer_and_protect;
use self::combine::{TargetLevels, combine, plain_band};
use self::criteria::Criterion;
use self::protect::ProtectedCells;
use self::select::{select_candidates, selection_field};

/// Owner name used in errors about the primary field.
const PRIMARY_FIELD_OWNER: &str = "refinement";

/// Pipeline stage, traced at `trace` level as a step progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AdaptStage {
    /// No step in progress.
    #[default]
    Idle,
    /// Reading and validating field data.
    Sampling,
    /// Binding criteria to the mesh snapshot.
    Evaluating,
    /// Building target levels.
    Combining,
    /// Thresholding and budgeting candidates.
    Selecting,
    /// Protection, buffer layers and balance closure.
    Buffering,
    /// Lists are final.
    Decided,
}

impl fmt::Display for AdaptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdaptStage::Idle => "idle",
            AdaptStage::Sampling => "sampling",
            AdaptStage::Evaluating => "evaluating",
            AdaptStage::Combining => "combining",
            AdaptStage::Selecting => "selecting",
            AdaptStage::Buffering => "buffering",
            AdaptStage::Decided => "decided",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default)]
struct StageTrace {
    stage: AdaptStage,
}

impl StageTrace {
    fn enter(&mut self, next: AdaptStage) {
        log::trace!("adapt: {} -> {}", self.stage, next);
        self.stage = next;
    }

    fn abort(&self, err: &AdaptError) {
        log::trace!("adapt: aborted while {}: {err}", self.stage);
    }
}

/// Counters reported with every decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionDiagnostics {
    /// Refinement seeds after thresholding, depth and budget cuts.
    pub candidates_before_buffer: usize,
    /// Cells in the final refine list.
    pub candidates_after_buffer: usize,
    /// Buffered cells removed because they are protected.
    pub dropped_protected: usize,
    /// Candidates or seeds removed to respect `maxCells`.
    pub dropped_budget: usize,
    /// Candidates already at `maxRefinement`.
    pub dropped_depth: usize,
    /// Size of the protected set.
    pub protected_cells: usize,
    /// Cells failing the anchor-point check.
    pub anchor_failures: usize,
    /// Poolable groups kept back to preserve 2:1 balance.
    pub dropped_pools: usize,
    /// Face pairs breaking 2:1 balance after projecting the decision.
    pub balance_violations: usize,
    /// Finest level the budget admitted, when it was binding.
    pub level_ceiling: Option<Level>,
}

impl fmt::Display for SelectionDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "candidates {} before buffering, {} after; dropped {} protected, {} over budget, {} at max depth",
            self.candidates_before_buffer,
            self.candidates_after_buffer,
            self.dropped_protected,
            self.dropped_budget,
            self.dropped_depth
        )?;
        if let Some(l) = self.level_ceiling {
            write!(f, "; level ceiling {l}")?;
        }
        if self.balance_violations > 0 {
            write!(f, "; {} faces break 2:1", self.balance_violations)?;
        }
        Ok(())
    }
}

/// Outcome of one adaptation step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefinementDecision {
    /// Cells to split, ascending.
    pub refine: Vec<CellId>,
    /// Cells to merge back, ascending. Never overlaps `refine`.
    pub unrefine: Vec<CellId>,
    /// Counters of the step.
    pub diagnostics: SelectionDiagnostics,
    /// Copy of the cell level field, when `dumpLevel` is set.
    pub level_dump: Option<Vec<Level>>,
}

impl RefinementDecision {
    /// `true` when the step changes nothing.
    pub fn is_empty(&self) -> bool {
        self.refine.is_empty() && self.unrefine.is_empty()
    }
}

/// Decide which cells to refine and unrefine on `mesh`.
pub fn decide<V: ConnectivityView>(
    mesh: &V,
    fields: &FieldSet,
    config: &RefinementConfig,
) -> Result<RefinementDecision, AdaptError> {
    let mut trace = StageTrace::default();
    decide_traced(mesh, fields, config, &mut trace).inspect_err(|e| trace.abort(e))
}

fn decide_traced<V: ConnectivityView>(
    mesh: &V,
    fields: &FieldSet,
    config: &RefinementConfig,
    trace: &mut StageTrace,
) -> Result<RefinementDecision, AdaptError> {
    let n = mesh.n_cells();

    trace.enter(AdaptStage::Sampling);
    config.validate()?;
    let criteria: Vec<Criterion> = if config.criteria_mode() {
        config
            .criteria
            .iter()
            .map(|(name, cfg)| Criterion::from_config(name, cfg))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        Vec::new()
    };
    let primary: Option<Cow<'_, [f64]>> = match (&config.field, config.criteria_mode()) {
        (Some(name), false) => Some(fields.try_magnitude(PRIMARY_FIELD_OWNER, name, n)?),
        _ => None,
    };

    trace.enter(AdaptStage::Evaluating);
    let evaluators: Vec<_> = criteria
        .iter()
        .map(|c| c.bind(mesh, fields, config.max_refinement))
        .collect::<Result<Vec<_>, _>>()?;
    for ev in &evaluators {
        log::debug!(
            "criterion `{}` ({}) active in {} cells",
            ev.criterion().name(),
            ev.criterion().kind(),
            ev.active_count()
        );
    }

    trace.enter(AdaptStage::Combining);
    let targets: TargetLevels = match &primary {
        Some(values) => plain_band(mesh, values, config.lower_refine_level, config.upper_refine_level),
        None => combine(mesh, &evaluators),
    };

    trace.enter(AdaptStage::Selecting);
    let selection = selection_field(mesh, &targets, primary.as_deref(), config.point_smoothing);
    let candidates = select_candidates(mesh, &targets, &selection, config);

    trace.enter(AdaptStage::Buffering);
    let protected = ProtectedCells::compute(mesh, config.protection_sweep_cap)?;
    let buffered = buffer_and_protect(
        mesh,
        &candidates.refine,
        &candidates.unrefine,
        &targets,
        &protected,
        config,
        candidates.allowance,
    );

    let levels = projected_levels(mesh, &buffered.refine, &buffered.unrefine);
    let balance_violations = check_balance(mesh, &levels, BalanceHandling::Warn)?;

    trace.enter(AdaptStage::Decided);
    let diagnostics = SelectionDiagnostics {
        candidates_before_buffer: candidates.refine.len(),
        candidates_after_buffer: buffered.refine.len(),
        dropped_protected: buffered.dropped_protected,
        dropped_budget: candidates.dropped_budget + buffered.dropped_budget,
        dropped_depth: candidates.dropped_depth,
        protected_cells: protected.len(),
        anchor_failures: protected.anchor_failures(),
        dropped_pools: buffered.dropped_pools,
        balance_violations,
        level_ceiling: candidates.level_ceiling,
    };
    log::info!("{diagnostics}");
    log::debug!("refine: [{}]", buffered.refine.iter().join(", "));
    log::debug!("unrefine: [{}]", buffered.unrefine.iter().join(", "));

    let decision = RefinementDecision {
        refine: buffered.refine,
        unrefine: buffered.unrefine,
        diagnostics,
        level_dump: config.dump_level.then(|| mesh.cell_levels()),
    };
    trace.enter(AdaptStage::Idle);
    Ok(decision)
}
