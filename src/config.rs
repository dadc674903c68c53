//! Refinement controller configuration.
//!
//! The coefficient dictionary of a dynamically refined mesh, as a serde
//! struct with camelCase keys. Every key has a default, so a
//! partial document deserializes; [`RefinementConfig::validate`] then checks
//! the cross-key constraints.
//!
//! ```
//! # use sieve_amr::config::RefinementConfig;
//! let cfg = RefinementConfig {
//!     field: Some("alpha".into()),
//!     ..RefinementConfig::default()
//! };
//! cfg.validate().unwrap();
//! assert_eq!(cfg.max_refinement, 2);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::adapt::criteria::CriterionConfig;
use crate::mesh_error::ConfigError;
use crate::topology::point::Level;

/// How the budget level ceiling treats the level that overflows the allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CeilingRounding {
    /// Admit the overflowing level; the priority truncation trims it.
    #[default]
    Up,
    /// Exclude the overflowing level unless it is the coarsest candidate level.
    Down,
}

/// Cell budget knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BudgetPolicy {
    /// Children produced by one split; `None` uses `2^dimension`.
    pub children_per_split: Option<u32>,
    /// Level ceiling rounding.
    pub ceiling_rounding: CeilingRounding,
}

/// What to do with a face flux after a topology change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FluxCorrection {
    /// `none`: leave the flux as mapped.
    Skip,
    /// `NaN`: poison the flux on new faces so stale use is detected.
    Poison,
    /// Recompute from the named velocity field.
    Velocity(String),
}

impl From<String> for FluxCorrection {
    fn from(s: String) -> Self {
        match s.as_str() {
            "none" => FluxCorrection::Skip,
            "NaN" => FluxCorrection::Poison,
            _ => FluxCorrection::Velocity(s),
        }
    }
}

impl From<FluxCorrection> for String {
    fn from(f: FluxCorrection) -> Self {
        f.to_string()
    }
}

impl fmt::Display for FluxCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FluxCorrection::Skip => f.write_str("none"),
            FluxCorrection::Poison => f.write_str("NaN"),
            FluxCorrection::Velocity(v) => f.write_str(v),
        }
    }
}

/// Full controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefinementConfig {
    /// Adapt every `refineInterval` time steps.
    pub refine_interval: u32,
    /// Primary field: the selection field in plain mode.
    pub field: Option<String>,
    /// Lower bound of the refinement band on the selection field.
    pub lower_refine_level: f64,
    /// Upper bound of the refinement band on the selection field.
    pub upper_refine_level: f64,
    /// Unrefine cells whose smeared selection value falls below this.
    pub unrefine_level: Option<f64>,
    /// Face-hop buffer around refinement seeds.
    pub n_buffer_layers: u32,
    /// Maximum refinement depth.
    pub max_refinement: Level,
    /// Maximum number of cells after refinement.
    pub max_cells: usize,
    /// Face flux name → correction.
    pub correct_fluxes: BTreeMap<String, FluxCorrection>,
    /// Attach a copy of the level field to each decision.
    pub dump_level: bool,
    /// Use the named criteria (false = plain single-field mode).
    pub enable_criteria: bool,
    /// Named criterion blocks.
    pub criteria: BTreeMap<String, CriterionConfig>,
    /// Max-smear the selection field through points before thresholding.
    pub point_smoothing: bool,
    /// Cell budget knobs.
    pub budget: BudgetPolicy,
    /// Generation cap for protection propagation; `None` = `nCells + 1`.
    pub protection_sweep_cap: Option<usize>,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            refine_interval: 1,
            field: None,
            lower_refine_level: 0.5,
            upper_refine_level: f64::MAX,
            unrefine_level: None,
            n_buffer_layers: 1,
            max_refinement: 2,
            max_cells: 200_000,
            correct_fluxes: BTreeMap::new(),
            dump_level: false,
            enable_criteria: true,
            criteria: BTreeMap::new(),
            point_smoothing: false,
            budget: BudgetPolicy::default(),
            protection_sweep_cap: None,
        }
    }
}

impl RefinementConfig {
    /// `true` when the named criteria drive selection.
    pub fn criteria_mode(&self) -> bool {
        self.enable_criteria && !self.criteria.is_empty()
    }

    /// Check cross-key constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refine_interval == 0 {
            return Err(ConfigError::InvalidOption {
                key: "refineInterval",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_cells == 0 {
            return Err(ConfigError::InvalidOption {
                key: "maxCells",
                reason: "must be positive".into(),
            });
        }
        if self.lower_refine_level.is_nan()
            || self.upper_refine_level.is_nan()
            || self.lower_refine_level > self.upper_refine_level
        {
            return Err(ConfigError::InvalidRange {
                name: "refinement band".into(),
                min: self.lower_refine_level,
                max: self.upper_refine_level,
            });
        }
        if self.unrefine_level.is_some_and(f64::is_nan) {
            return Err(ConfigError::InvalidOption {
                key: "unrefineLevel",
                reason: "must be a number".into(),
            });
        }
        if !self.criteria_mode() && self.field.is_none() {
            return Err(ConfigError::MissingEntry {
                name: "refinement".into(),
                key: "field",
            });
        }
        if let Some(k) = self.budget.children_per_split {
            if k < 2 {
                return Err(ConfigError::InvalidOption {
                    key: "childrenPerSplit",
                    reason: format!("a split must produce at least 2 children, got {k}"),
                });
            }
        }
        if self.protection_sweep_cap == Some(0) {
            return Err(ConfigError::InvalidOption {
                key: "protectionSweepCap",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }

    /// Children produced by splitting one cell of a mesh of `dimension`.
    pub fn children_per_split(&self, dimension: u32) -> usize {
        self.budget
            .children_per_split
            .map_or(1usize << dimension.clamp(1, 3), |k| k as usize)
    }
}
