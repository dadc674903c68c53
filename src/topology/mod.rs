//! Mesh topology: dense ids, CSR tables and the connectivity view the
//! refinement pipeline reads.
//!
//! [`ConnectivityView`] is the only way the selection code sees a mesh;
//! [`InMemoryMesh`] is the CSR-backed implementation used by tests, benches
//! and callers without their own mesh store.

pub mod connectivity;
pub mod csr;
pub mod mesh;
pub mod point;
pub mod validation;

pub use connectivity::{CellGroup, ConnectivityView};
pub use mesh::InMemoryMesh;
pub use point::{CellId, Level, PointId};
pub use validation::DebugInvariants;
