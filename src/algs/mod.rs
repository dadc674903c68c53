//! Mesh algorithms used by the refinement pipeline.

pub mod layers;
pub mod meshgen;
pub mod sampling;

pub use layers::{grow_layers, within_hops};
pub use meshgen::hex_box;
pub use sampling::FieldSampler;
