#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-locate
//!
//! mesh-locate is the topology and spatial-query engine for unstructured
//! hexahedral, prism and quad-surface meshes. A mesh stores only point
//! coordinates and element connectivity; edges, faces, node/element
//! adjacency, the bounding volume and the search grids are derived on
//! demand, cached, and kept consistent under concurrent access.
//!
//! ## Features
//! - Canonical edge and face tables built by hashed deduplication, robust to
//!   degenerate (collapsed) elements and non-manifold input
//! - Build-once synchronization of derived tables: concurrent callers wait
//!   instead of recomputing, and a failing builder poisons instead of hanging
//! - Uniform search grids for point location, nearest node and nearest
//!   element queries
//! - A pluggable [`Basis`](basis::Basis) for local coordinates and element
//!   measures, with a linear Lagrange implementation included
//!
//! ## Usage
//!
//! ```
//! use mesh_locate::prelude::*;
//!
//! let mut mesh = HexVolMesh::new();
//! mesh.add_element_from_points(
//!     &[
//!         [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0],
//!         [0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0],
//!     ],
//!     1e-6,
//! )?;
//!
//! mesh.synchronize(TableMask::EDGES | TableMask::FACES)?;
//! assert_eq!(mesh.edge_table("doc")?.len(), 12);
//! assert_eq!(mesh.boundary_mask(ElementId::new(0))?, 0x3F);
//!
//! // spatial queries synchronize what they need
//! assert_eq!(mesh.locate_element([0.5, 0.5, 0.5])?, Some(ElementId::new(0)));
//! # Ok::<(), MeshError>(())
//! ```
//!
//! Enable the `rayon` feature to parallelise bounding-box reductions.
//!
//! ## Determinism
//!
//! Edge and face ids are assigned in first-seen order while scanning
//! elements, so the same input always yields the same tables regardless of
//! how the builders were scheduled.

pub mod algs;
pub mod basis;
pub mod geometry;
pub mod mesh;
pub mod mesh_error;
pub mod sync;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::locate::{ClosestElement, ClosestNode};
    pub use crate::basis::{Basis, ElementContext, LinearLagrange, LocalCoords};
    pub use crate::geometry::bbox::BBox;
    pub use crate::geometry::vector::Point;
    pub use crate::mesh::data::MeshData;
    pub use crate::mesh::{HexVolMesh, Mesh, MeshConfig, PrismVolMesh, QuadSurfMesh};
    pub use crate::mesh_error::{MeshError, PreconditionError};
    pub use crate::sync::{Dispatch, Table, TableMask};
    pub use crate::topology::cache::InvalidateCache;
    pub use crate::topology::cell_type::{CellType, ElementShape, HexShape, PrismShape, QuadShape};
    pub use crate::topology::point::{EdgeId, ElementId, FaceId, NodeId};
}
