//! Error types for refinement decisions.
//!
//! [`ConfigError`] covers everything that can be wrong with the configuration
//! surface or the named fields it references. [`AdaptError`] is the error of a
//! whole adaptation step and wraps configuration errors alongside the few
//! internal failures that abort a step.

use thiserror::Error;

use crate::topology::point::CellId;

/// A configuration problem detected before any candidate computation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The `kind` entry of a criterion block is not recognised.
    #[error("criterion `{name}`: unknown kind `{kind}`")]
    UnknownCriterionKind { name: String, kind: String },
    /// A criterion block is missing a required key.
    #[error("criterion `{name}`: missing required entry `{key}`")]
    MissingEntry { name: String, key: &'static str },
    /// A referenced field is not present in the field set.
    #[error("criterion `{criterion}` references missing field `{field}`")]
    MissingField { criterion: String, field: String },
    /// A field exists but holds the wrong kind of data.
    #[error("field `{field}` is a {found} field, `{criterion}` needs a {expected} field")]
    FieldKind {
        criterion: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    /// A field does not have one value per cell.
    #[error("field `{field}` has {found} values, expected {expected}")]
    FieldLength {
        field: String,
        expected: usize,
        found: usize,
    },
    /// A field holds NaN or an infinity.
    #[error("field `{field}` holds a non-finite value at cell {cell}")]
    NonFiniteValue { field: String, cell: CellId },
    /// `minValue > maxValue` in a criterion block.
    #[error("criterion `{name}`: minValue {min} exceeds maxValue {max}")]
    InvalidRange { name: String, min: f64, max: f64 },
    /// A static region names a cell the mesh does not have.
    #[error("criterion `{name}`: cell {cell} is outside the mesh ({n_cells} cells)")]
    CellOutOfRange {
        name: String,
        cell: u32,
        n_cells: usize,
    },
    /// A top-level option has an unusable value.
    #[error("invalid option `{key}`: {reason}")]
    InvalidOption { key: &'static str, reason: String },
}

/// Failure of a complete adaptation step.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdaptError {
    /// The configuration or its referenced fields are unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Protected-cell propagation kept growing past its generation cap.
    #[error("protected-cell propagation did not converge within {cap} generations")]
    ProtectionDidNotConverge { cap: usize },
    /// Connectivity handed to a mesh constructor is inconsistent.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
    /// The mesh-cutting engine rejected a refine/unrefine request.
    #[error("mesh cutter failed to {operation} {cells} cells: {reason}")]
    Cutter {
        operation: &'static str,
        cells: usize,
        reason: String,
    },
}
