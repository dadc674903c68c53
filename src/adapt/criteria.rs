//! Named refinement criteria.
//!
//! A criterion block in the configuration is a [`CriterionConfig`]; it is
//! validated into a [`Criterion`] once, and bound to one mesh snapshot and
//! field set as a [`CriterionEvaluator`] every step. An evaluator answers
//! `evaluate(cell)` with the level that criterion requests for the cell, or
//! `None` when the criterion is not active there.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::algs::layers::grow_layers;
use crate::algs::sampling::FieldSampler;
use crate::data::fields::{FieldData, FieldSet};
use crate::mesh_error::ConfigError;
use crate::topology::connectivity::ConnectivityView;
use crate::topology::point::{CellId, Level};

const INTERFACE_MIN_JUMP: f64 = 0.1;
const INTERFACE_ISO_VALUE: f64 = 0.5;

/// The supported criterion kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CriterionKind {
    /// `minValue <= value <= maxValue`.
    Field,
    /// Band on the gradient magnitude.
    Gradient,
    /// Band on the curl magnitude.
    Curl,
    /// Cells around a sharp jump of a phase fraction, at the global maximum
    /// level.
    Interface,
    /// A fixed cell list held at a fixed level.
    StaticRegion,
}

impl CriterionKind {
    /// Canonical keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            CriterionKind::Field => "field",
            CriterionKind::Gradient => "gradient",
            CriterionKind::Curl => "curl",
            CriterionKind::Interface => "interface",
            CriterionKind::StaticRegion => "staticRegion",
        }
    }
}

impl fmt::Display for CriterionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known [`CriterionKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown criterion kind `{}`", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for CriterionKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "field" | "fields" => Ok(CriterionKind::Field),
            "gradient" | "gradients" => Ok(CriterionKind::Gradient),
            "curl" | "curls" => Ok(CriterionKind::Curl),
            "interface" => Ok(CriterionKind::Interface),
            "staticRegion" | "refinedRegion" => Ok(CriterionKind::StaticRegion),
            other => Err(UnknownKind(other.to_owned())),
        }
    }
}

/// One criterion block as written in the configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CriterionConfig {
    /// Criterion kind keyword (see [`CriterionKind`]).
    pub kind: String,
    /// Field the criterion samples.
    pub field_name: Option<String>,
    /// Lower bound of the active band.
    pub min_value: Option<f64>,
    /// Upper bound of the active band.
    pub max_value: Option<f64>,
    /// Level requested where active (ignored by `interface`).
    pub refine_level: Option<Level>,
    /// Extra buffer layers around cells where this criterion is active.
    pub n_add_layers: u32,
    /// Cell ids of a static region.
    pub cells: Option<Vec<u32>>,
    /// Phase boundary value of an interface criterion.
    pub iso_value: Option<f64>,
    /// Hops the interface band grows into the `>= isoValue` side.
    pub inner_layers: u32,
    /// Hops the interface band grows into the `< isoValue` side.
    pub outer_layers: u32,
}

#[derive(Debug, Clone, PartialEq)]
enum Rule {
    Band {
        kind: CriterionKind,
        field: String,
        min: f64,
        max: f64,
        level: Level,
    },
    Interface {
        field: String,
        min: f64,
        max: f64,
        iso: f64,
        inner: u32,
        outer: u32,
    },
    StaticRegion {
        cells: Vec<u32>,
        level: Level,
    },
}

/// A validated criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    name: String,
    rule: Rule,
    n_add_layers: u32,
}

fn required<T: Clone>(name: &str, key: &'static str, v: &Option<T>) -> Result<T, ConfigError> {
    v.clone().ok_or_else(|| ConfigError::MissingEntry {
        name: name.to_owned(),
        key,
    })
}

fn checked_range(name: &str, min: f64, max: f64) -> Result<(f64, f64), ConfigError> {
    if min.is_nan() || max.is_nan() || min > max {
        return Err(ConfigError::InvalidRange {
            name: name.to_owned(),
            min,
            max,
        });
    }
    Ok((min, max))
}

impl Criterion {
    /// Validate a configuration block.
    pub fn from_config(name: &str, cfg: &CriterionConfig) -> Result<Self, ConfigError> {
        if cfg.kind.is_empty() {
            return Err(ConfigError::MissingEntry {
                name: name.to_owned(),
                key: "kind",
            });
        }
        let kind: CriterionKind =
            cfg.kind
                .parse()
                .map_err(|UnknownKind(kind)| ConfigError::UnknownCriterionKind {
                    name: name.to_owned(),
                    kind,
                })?;

        let rule = match kind {
            CriterionKind::Field | CriterionKind::Gradient | CriterionKind::Curl => {
                let field = required(name, "fieldName", &cfg.field_name)?;
                let (min, max) = checked_range(
                    name,
                    required(name, "minValue", &cfg.min_value)?,
                    required(name, "maxValue", &cfg.max_value)?,
                )?;
                let level = required(name, "refineLevel", &cfg.refine_level)?;
                Rule::Band {
                    kind,
                    field,
                    min,
                    max,
                    level,
                }
            }
            CriterionKind::Interface => {
                let field = required(name, "fieldName", &cfg.field_name)?;
                let (min, max) = checked_range(
                    name,
                    cfg.min_value.unwrap_or(INTERFACE_MIN_JUMP),
                    cfg.max_value.unwrap_or(f64::MAX),
                )?;
                let iso = cfg.iso_value.unwrap_or(INTERFACE_ISO_VALUE);
                if !iso.is_finite() {
                    return Err(ConfigError::InvalidOption {
                        key: "isoValue",
                        reason: format!("criterion `{name}`: must be finite"),
                    });
                }
                Rule::Interface {
                    field,
                    min,
                    max,
                    iso,
                    inner: cfg.inner_layers,
                    outer: cfg.outer_layers,
                }
            }
            CriterionKind::StaticRegion => Rule::StaticRegion {
                cells: required(name, "cells", &cfg.cells)?,
                level: required(name, "refineLevel", &cfg.refine_level)?,
            },
        };

        Ok(Self {
            name: name.to_owned(),
            rule,
            n_add_layers: cfg.n_add_layers,
        })
    }

    /// Criterion name (its key in the configuration).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Criterion kind.
    pub fn kind(&self) -> CriterionKind {
        match &self.rule {
            Rule::Band { kind, .. } => *kind,
            Rule::Interface { .. } => CriterionKind::Interface,
            Rule::StaticRegion { .. } => CriterionKind::StaticRegion,
        }
    }

    /// Extra buffer layers around active cells.
    pub fn n_add_layers(&self) -> u32 {
        self.n_add_layers
    }

    /// Field this criterion reads, if any.
    pub fn field_name(&self) -> Option<&str> {
        match &self.rule {
            Rule::Band { field, .. } | Rule::Interface { field, .. } => Some(field),
            Rule::StaticRegion { .. } => None,
        }
    }

    /// Evaluate the criterion on one mesh snapshot.
    ///
    /// `max_refinement` is the level an interface criterion requests.
    pub fn bind<V: ConnectivityView>(
        &self,
        mesh: &V,
        fields: &FieldSet,
        max_refinement: Level,
    ) -> Result<CriterionEvaluator<'_>, ConfigError> {
        let n = mesh.n_cells();
        let sampler = FieldSampler::new(mesh);
        let (mask, level) = match &self.rule {
            Rule::Band {
                kind,
                field,
                min,
                max,
                level,
            } => {
                let values = match kind {
                    CriterionKind::Field => fields.try_magnitude(&self.name, field, n)?.into_owned(),
                    CriterionKind::Gradient => match fields.get(field) {
                        Some(FieldData::Vector(_)) => {
                            let u = fields.try_vector(&self.name, field, n)?;
                            vector_gradient_magnitude(&sampler, u)
                        }
                        _ => sampler.gradient_magnitude(fields.try_scalar(&self.name, field, n)?),
                    },
                    _ => sampler.curl_magnitude(fields.try_vector(&self.name, field, n)?),
                };
                let mask = values.iter().map(|v| (*min..=*max).contains(v)).collect();
                (mask, *level)
            }
            Rule::Interface {
                field,
                min,
                max,
                iso,
                inner,
                outer,
            } => {
                let alpha = fields.try_scalar(&self.name, field, n)?;
                let jump = sampler.face_jump(alpha);
                let band: Vec<CellId> = mesh
                    .cells()
                    .filter(|c| (*min..=*max).contains(&jump[c.index()]))
                    .collect();
                let inside = grow_layers(mesh, band.iter().map(|&c| (c, *inner)), |c| {
                    alpha[c.index()] >= *iso
                });
                let outside = grow_layers(mesh, band.iter().map(|&c| (c, *outer)), |c| {
                    alpha[c.index()] < *iso
                });
                let mask = inside.iter().zip(&outside).map(|(a, b)| *a || *b).collect();
                (mask, max_refinement)
            }
            Rule::StaticRegion { cells, level } => {
                let mut mask = vec![false; n];
                for &c in cells {
                    let slot = mask.get_mut(c as usize).ok_or_else(|| ConfigError::CellOutOfRange {
                        name: self.name.clone(),
                        cell: c,
                        n_cells: n,
                    })?;
                    *slot = true;
                }
                (mask, *level)
            }
        };
        Ok(CriterionEvaluator {
            criterion: self,
            level,
            mask,
        })
    }
}

fn vector_gradient_magnitude<V: ConnectivityView>(
    sampler: &FieldSampler<'_, V>,
    u: &[[f64; 3]],
) -> Vec<f64> {
    let mut sum = vec![0.0; u.len()];
    for d in 0..3 {
        let component: Vec<f64> = u.iter().map(|x| x[d]).collect();
        for (s, g) in sum.iter_mut().zip(sampler.gradient_magnitude(&component)) {
            *s += g * g;
        }
    }
    sum.into_iter().map(f64::sqrt).collect()
}

/// A criterion bound to one mesh snapshot.
#[derive(Debug, Clone)]
pub struct CriterionEvaluator<'c> {
    criterion: &'c Criterion,
    level: Level,
    mask: Vec<bool>,
}

impl CriterionEvaluator<'_> {
    /// Level requested for `cell`, or `None` when inactive there.
    #[inline]
    pub fn evaluate(&self, cell: CellId) -> Option<Level> {
        self.mask[cell.index()].then_some(self.level)
    }

    /// The criterion this evaluator was bound from.
    pub fn criterion(&self) -> &Criterion {
        self.criterion
    }

    /// Number of cells where the criterion is active.
    pub fn active_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}
