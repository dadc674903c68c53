//! Field data handed to the refinement criteria.

pub mod fields;

pub use fields::{FieldData, FieldSet};
