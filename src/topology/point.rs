//! Strong, zero-cost handles for mesh entities.
//!
//! Nodes and elements are dense, 0-based array positions in the
//! [`GeometryStore`](crate::topology::geometry_store::GeometryStore). Edges and
//! faces are positions in the derived tables built by
//! [`TopologyIndex`](crate::topology::index). All four wrap a `u32` so that the
//! half-entity references below stay a single machine word.
//!
//! This module provides:
//! - `NodeId`, `ElementId`, `EdgeId`, `FaceId` newtypes (`repr(transparent)`).
//! - [`HalfEdge`] / [`HalfFace`]: one element's local occurrence of an edge or
//!   face, as an explicit `(element, slot)` pair.

use std::fmt;

macro_rules! dense_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wraps a raw index.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                $name(raw)
            }

            /// Returns the raw `u32` value.
            #[inline]
            pub const fn get(self) -> u32 {
                self.0
            }

            /// Returns the id as an array position.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub(crate) fn from_index(index: usize) -> Self {
                debug_assert!(index < u32::MAX as usize);
                $name(index as u32)
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(raw: u32) -> Self {
                $name(raw)
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
    };
}

dense_id!(
    /// Index of a node (point) in the geometry store.
    NodeId
);
dense_id!(
    /// Index of an element (cell, or face-as-element for surface meshes).
    ElementId
);
dense_id!(
    /// Index into the derived edge table.
    EdgeId
);
dense_id!(
    /// Index into the derived face table.
    FaceId
);

impl NodeId {
    /// Sentinel filling the fourth slot of a triangular face key.
    ///
    /// Never a valid node: element insertion rejects ids `>= node_count`.
    pub const DUMMY: NodeId = NodeId(u32::MAX);

    /// `true` for the triangle sentinel.
    #[inline]
    pub const fn is_dummy(self) -> bool {
        self.0 == u32::MAX
    }
}

/// One element's local occurrence of an edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HalfEdge {
    /// Owning element.
    pub element: ElementId,
    /// Local edge slot within the element's edge table.
    pub slot: u8,
}

/// One element's local occurrence of a face.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HalfFace {
    /// Owning element.
    pub element: ElementId,
    /// Local face slot within the element's face table.
    pub slot: u8,
}

impl HalfEdge {
    #[inline]
    pub const fn new(element: ElementId, slot: u8) -> Self {
        HalfEdge { element, slot }
    }
}

impl HalfFace {
    #[inline]
    pub const fn new(element: ElementId, slot: u8) -> Self {
        HalfFace { element, slot }
    }
}

#[cfg(test)]
mod layout_tests {
    //! Compile-time assertions on the id layout.
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(NodeId, u32);
    assert_eq_size!(ElementId, u32);
    assert_eq_size!(HalfEdge, u64);
    assert_eq_size!(HalfFace, u64);
}
