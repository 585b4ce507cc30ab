//! Dense `u32` identifiers for graph nodes, graph edges and hazard chunks.
//!
//! Each id is the position of its item in a per-kind `Vec`, so `.index()` is
//! all a lookup needs.  `u32::MAX` is reserved as the "unset" marker.

use std::fmt;

macro_rules! dense_ids {
    ($( $(#[$attr:meta])* $name:ident => $label:literal; )+) => {$(
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u32);

        impl $name {
            /// Marks a slot that has not been assigned an id.
            pub const INVALID: $name = $name(u32::MAX);

            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, concat!($label, " {}"), self.0)
                } else {
                    f.write_str(concat!($label, " <unset>"))
                }
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                u32::try_from(n).map($name)
            }
        }
    )+};
}

dense_ids! {
    /// Road-graph node, numbered in insertion order.
    NodeId => "node";

    /// Directed road-graph edge, numbered in CSR order.
    EdgeId => "edge";

    /// Hazard chunk, numbered row-major from the south-west corner.
    ChunkId => "chunk";
}

impl ChunkId {
    /// The chunk at `row`, `col` of a grid `cols` chunks wide.
    #[inline]
    pub fn at(row: usize, col: usize, cols: usize) -> ChunkId {
        ChunkId((row * cols + col) as u32)
    }

    /// Inverse of [`ChunkId::at`].
    #[inline]
    pub fn row_col(self, cols: usize) -> (usize, usize) {
        (self.index() / cols, self.index() % cols)
    }
}
