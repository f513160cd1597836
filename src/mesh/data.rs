//! Serializable view of a mesh.
//!
//! Only raw geometry is persisted: the point array and the flat connectivity.
//! Every derived table is rebuilt on demand after loading.

use serde::{Deserialize, Serialize};

use super::Mesh;
use crate::basis::Basis;
use crate::geometry::vector::Point;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::{CellType, ElementShape};
use crate::topology::geometry_store::GeometryStore;
use crate::topology::point::NodeId;

/// Points and connectivity of a mesh, ready for `serde`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    /// Element family the connectivity was written for.
    pub cell_type: CellType,
    /// Node coordinates, indexed by node id.
    pub points: Vec<Point>,
    /// `arity` node ids per element, back to back.
    pub elements: Vec<NodeId>,
}

impl MeshData {
    pub fn element_count(&self) -> usize {
        self.elements.len() / self.cell_type.vertex_count()
    }
}

impl<S: ElementShape, B: Basis<S>> Mesh<S, B> {
    /// Copies the raw geometry out of the mesh.
    pub fn to_data(&self) -> MeshData {
        let geom = self.geometry();
        MeshData {
            cell_type: S::CELL_TYPE,
            points: geom.points().to_vec(),
            elements: geom.element_nodes_raw().to_vec(),
        }
    }

    /// Replaces the geometry with `data` and resets synchronization to raw
    /// nodes and elements only.
    ///
    /// On error the mesh is left untouched.
    pub fn load_data(&mut self, data: MeshData) -> Result<(), MeshError> {
        if data.cell_type != S::CELL_TYPE {
            return Err(MeshError::CellTypeMismatch {
                expected: S::CELL_TYPE,
                found: data.cell_type,
            });
        }
        let mut geom = GeometryStore::new();
        geom.set_points(data.points)?;
        geom.set_element_nodes_raw(data.elements)?;
        *self.geometry_mut() = geom;
        self.clear_synchronization();
        Ok(())
    }

    /// Builds a mesh from persisted data, using `basis`.
    pub fn from_data_with_basis(data: MeshData, basis: B) -> Result<Self, MeshError> {
        let mut mesh = Self::with_basis(basis);
        mesh.load_data(data)?;
        Ok(mesh)
    }
}

impl<S: ElementShape, B: Basis<S> + Default> Mesh<S, B> {
    /// Builds a mesh from persisted data.
    pub fn from_data(data: MeshData) -> Result<Self, MeshError> {
        Self::from_data_with_basis(data, B::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{HexVolMesh, QuadSurfMesh};
    use crate::sync::TableMask;

    fn two_quads() -> QuadSurfMesh {
        let mut mesh = QuadSurfMesh::new();
        let n: Vec<NodeId> = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [2.0, 1.0, 0.0],
        ]
        .into_iter()
        .map(|p| mesh.add_point(p))
        .collect();
        mesh.add_element(&[n[0], n[1], n[4], n[3]]).unwrap();
        mesh.add_element(&[n[1], n[2], n[5], n[4]]).unwrap();
        mesh
    }

    #[test]
    fn data_round_trips_raw_geometry() {
        let mesh = two_quads();
        let data = mesh.to_data();
        assert_eq!(data.cell_type, CellType::Quadrilateral);
        assert_eq!(data.element_count(), 2);
        let back = QuadSurfMesh::from_data(data.clone()).unwrap();
        assert_eq!(back.to_data(), data);
    }

    #[test]
    fn loading_resets_synchronization() {
        let mut mesh = two_quads();
        mesh.synchronize(TableMask::EDGES).unwrap();
        let data = mesh.to_data();
        mesh.load_data(data).unwrap();
        assert!(!mesh.is_synchronized(TableMask::EDGES));
        assert!(mesh.is_synchronized(TableMask::RAW));
    }

    #[test]
    fn wrong_family_is_rejected() {
        let data = two_quads().to_data();
        let err = HexVolMesh::from_data(data).unwrap_err();
        assert_eq!(
            err,
            MeshError::CellTypeMismatch {
                expected: CellType::Hexahedron,
                found: CellType::Quadrilateral,
            }
        );
    }

    #[test]
    fn dangling_connectivity_is_rejected() {
        let mut data = two_quads().to_data();
        data.points.truncate(4);
        let mut mesh = two_quads();
        assert!(matches!(
            mesh.load_data(data),
            Err(MeshError::NodeOutOfRange { .. })
        ));
        assert_eq!(mesh.node_count(), 6);
    }
}
