//! `CellId` / `PointId`: strong, zero-cost handles for mesh cells and vertices.
//!
//! Both ids are dense 0-based indices: every per-cell or per-point quantity in
//! this crate is a plain `Vec<T>` (or slice) indexed by the id, never a map.
//! The newtypes keep cells and points from being mixed up at compile time.
//!
//! This module provides:
//! - `#[repr(transparent)]` wrappers around `u32` with the same layout as the
//!   raw integer.
//! - Constructors from raw values and from `usize` indices.
//! - `Debug`/`Display`, ordering and hashing so ids can be sorted, printed and
//!   stored in sets.

use std::fmt;

/// Refinement depth of a cell or point relative to the coarsest mesh.
pub type Level = u8;

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
        )]
        #[repr(transparent)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wraps a raw id.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                $name(raw)
            }

            /// Builds an id from an array index.
            ///
            /// # Panics
            ///
            /// Panics if `index` does not fit in a `u32`.
            #[inline]
            pub fn from_index(index: usize) -> Self {
                $name(u32::try_from(index).expect(concat!(stringify!($name), " index overflows u32")))
            }

            /// Returns the raw `u32` value.
            #[inline]
            pub const fn get(self) -> u32 {
                self.0
            }

            /// Returns the id as an array index.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(id: $name) -> usize {
                id.index()
            }
        }
    };
}

dense_id!(
    /// Handle of a mesh cell (a node of the face-adjacency graph).
    CellId
);

dense_id!(
    /// Handle of a mesh vertex. A conforming hexahedron has 8 anchor points.
    PointId
);
