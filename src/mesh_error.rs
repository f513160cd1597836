//! MeshError: Unified error type for mesh-locate public APIs
//!
//! This error type is used throughout the library to provide robust,
//! non-panicking error handling for all public APIs. "Not found" results of
//! locate and closest-point queries are *not* errors; they are reported as
//! `None` or an empty collection.

use crate::sync::mask::{Table, TableMask};
use crate::topology::cell_type::CellType;
use crate::topology::point::{ElementId, NodeId};
use thiserror::Error;

/// A derived table was read before it was synchronized.
///
/// This is a programming error on the caller's side: the operation named in
/// `operation` needs every table in `missing` to be present. Call
/// [`Mesh::synchronize`](crate::mesh::Mesh::synchronize) first.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("`{operation}` requires synchronized tables {missing:?}")]
pub struct PreconditionError {
    /// Name of the operation that was called.
    pub operation: &'static str,
    /// Tables that were not present at the time of the call.
    pub missing: TableMask,
}

/// Unified error type for mesh operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// An element was added with the wrong number of nodes for its family.
    #[error("element arity mismatch: expected {expected} nodes, got {found}")]
    ArityMismatch { expected: usize, found: usize },
    /// A node id does not refer to an existing node.
    #[error("node {node} out of range (mesh has {len} nodes)")]
    NodeOutOfRange { node: NodeId, len: usize },
    /// An element id does not refer to an existing element.
    #[error("element {element} out of range (mesh has {len} elements)")]
    ElementOutOfRange { element: ElementId, len: usize },
    /// An edge or face id does not refer to an entry of its table.
    #[error("{kind} {index} out of range (table has {len} entries)")]
    EntityOutOfRange {
        kind: &'static str,
        index: u32,
        len: usize,
    },
    /// A flat connectivity array whose length is not a multiple of the arity.
    #[error("connectivity length {len} is not a multiple of arity {arity}")]
    RaggedConnectivity { len: usize, arity: usize },
    /// Persisted data of another element family.
    #[error("cell type mismatch: mesh holds {expected:?}, data holds {found:?}")]
    CellTypeMismatch { expected: CellType, found: CellType },
    /// Raised when a derived table is read before it was synchronized.
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    /// A table builder failed; the mesh stays unusable until
    /// `clear_synchronization`.
    #[error("building table {table:?} failed; synchronization is poisoned")]
    Poisoned { table: Table },
    /// Geometry that the basis cannot work with (degenerate Jacobian, …).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}
