//! Mesh topology: ids, element families, raw geometry and derived tables.
//!
//! This module provides the building blocks the [`Mesh`](crate::mesh::Mesh)
//! is assembled from:
//! - dense ids and half-edge / half-face references ([`point`])
//! - element families and their static local tables ([`cell_type`])
//! - the raw point and connectivity store ([`geometry_store`])
//! - canonical edge/face keys and the derived tables built from them
//!   ([`canonical`], [`index`])
//! - adjacency queries on a synchronized mesh ([`adjacency`])

pub mod adjacency;
pub mod cache;
pub mod canonical;
pub mod cell_type;
pub mod geometry_store;
pub mod index;
pub mod point;

pub use cache::InvalidateCache;
pub use cell_type::{CellType, ElementShape, HexShape, PrismShape, QuadShape};
pub use point::{EdgeId, ElementId, FaceId, HalfEdge, HalfFace, NodeId};
