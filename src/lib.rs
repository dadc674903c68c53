#![cfg_attr(docsrs, feature(doc_cfg))]
//! # sieve-amr
//!
//! sieve-amr is the decision engine of an adaptive mesh refinement controller
//! for unstructured hexahedral meshes. Given a mesh snapshot, per-cell fields
//! and a set of named refinement criteria, it decides which cells to split and
//! which previously split cells to merge back, while keeping:
//!
//! - 2:1 level balance between face neighbours,
//! - protected regions and the 8-anchor-point topology of refinable hexes,
//! - the maximum cell count and the maximum refinement depth.
//!
//! The crate never cuts the mesh itself. It reads connectivity through
//! [`ConnectivityView`](topology::ConnectivityView) and hands the resulting
//! lists to a [`MeshCutter`](controller::MeshCutter).
//!
//! ## Features
//! - Criteria on field values, gradient and curl magnitudes, interface bands
//!   and static regions, max-combined into one target level per cell
//! - Cell budget with a per-level ceiling and priority truncation
//! - Face-layer buffering, anchor-point protection and balance closure
//! - Optional parallel stencil evaluation with the `rayon` feature
//!
//! ## Determinism
//!
//! Decisions are a pure function of the mesh, the fields and the
//! configuration. Output lists are sorted by cell id, and criteria are
//! combined with an order-independent maximum.
//!
//! ## Usage
//!
//! ```
//! use sieve_amr::prelude::*;
//!
//! let mesh = hex_box([4, 4, 4], [1.0; 3]).unwrap();
//! let mut fields = FieldSet::new();
//! fields.insert_scalar("alpha", vec![0.0; mesh.n_cells()]);
//!
//! let config = RefinementConfig {
//!     field: Some("alpha".into()),
//!     ..RefinementConfig::default()
//! };
//! let decision = decide(&mesh, &fields, &config).unwrap();
//! assert!(decision.is_empty());
//! ```

pub mod adapt;
pub mod algs;
pub mod config;
pub mod controller;
pub mod data;
pub mod mesh_error;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::adapt::criteria::{Criterion, CriterionConfig, CriterionKind};
    pub use crate::adapt::{AdaptStage, RefinementDecision, SelectionDiagnostics, decide};
    pub use crate::algs::meshgen::hex_box;
    pub use crate::config::{BudgetPolicy, CeilingRounding, FluxCorrection, RefinementConfig};
    pub use crate::controller::{MeshCutter, RefinementController};
    pub use crate::data::fields::{FieldData, FieldSet};
    pub use crate::mesh_error::{AdaptError, ConfigError};
    pub use crate::topology::{
        CellGroup, CellId, ConnectivityView, DebugInvariants, InMemoryMesh, Level, PointId,
    };
}
