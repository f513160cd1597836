//! Adjacency queries between nodes, edges, faces and elements.
//!
//! All queries read already-synchronized tables and never build anything:
//! a missing table is reported as [`PreconditionError`] naming the tables
//! that must be synchronized first. Results that are sets are returned
//! sorted and deduplicated.
//!
//! [`PreconditionError`]: crate::mesh_error::PreconditionError

use itertools::Itertools;

use crate::basis::Basis;
use crate::geometry::vector::{Point, centroid};
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::ElementShape;
use crate::topology::index::{Edge, Face};
use crate::topology::point::{EdgeId, ElementId, FaceId, NodeId};

impl<S: ElementShape, B: Basis<S>> Mesh<S, B> {
    fn edge(&self, operation: &'static str, id: EdgeId) -> Result<&Edge, MeshError> {
        let edges = self.edge_table(operation)?;
        edges.get(id).ok_or(MeshError::EntityOutOfRange {
            kind: "edge",
            index: id.get(),
            len: edges.len(),
        })
    }

    fn face(&self, operation: &'static str, id: FaceId) -> Result<&Face, MeshError> {
        let faces = self.face_table(operation)?;
        faces.get(id).ok_or(MeshError::EntityOutOfRange {
            kind: "face",
            index: id.get(),
            len: faces.len(),
        })
    }

    fn check_node(&self, node: NodeId) -> Result<(), MeshError> {
        if node.index() < self.node_count() {
            Ok(())
        } else {
            Err(MeshError::NodeOutOfRange {
                node,
                len: self.node_count(),
            })
        }
    }

    /// Local slots at which `node` appears in `element`.
    fn local_slots(&self, element: ElementId, node: NodeId) -> Result<Vec<usize>, MeshError> {
        Ok(self
            .element_nodes(element)?
            .iter()
            .positions(|&n| n == node)
            .collect())
    }

    // --- node ---------------------------------------------------------------

    /// Elements using `node`. Needs `NODE_NEIGHBORS`.
    pub fn elements_of_node(&self, node: NodeId) -> Result<Vec<ElementId>, MeshError> {
        self.check_node(node)?;
        Ok(self
            .node_neighbor_table("elements_of_node")?
            .of_node(node)
            .to_vec())
    }

    /// Edges ending at `node`. Needs `EDGES | NODE_NEIGHBORS`.
    pub fn edges_of_node(&self, node: NodeId) -> Result<Vec<EdgeId>, MeshError> {
        self.check_node(node)?;
        let edges = self.edge_table("edges_of_node")?;
        let incident = self.node_neighbor_table("edges_of_node")?;
        let mut out = Vec::new();
        for &element in incident.of_node(node) {
            let local = edges.of_element(element);
            for slot in self.local_slots(element, node)? {
                out.extend(S::NODE_EDGES[slot].iter().filter_map(|&e| local.get(e).copied().flatten()));
            }
        }
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    /// Faces containing `node`. Needs `FACES | NODE_NEIGHBORS`.
    pub fn faces_of_node(&self, node: NodeId) -> Result<Vec<FaceId>, MeshError> {
        self.check_node(node)?;
        let faces = self.face_table("faces_of_node")?;
        let incident = self.node_neighbor_table("faces_of_node")?;
        let mut out = Vec::new();
        for &element in incident.of_node(node) {
            let local = faces.of_element(element);
            for slot in self.local_slots(element, node)? {
                out.extend(S::NODE_FACES[slot].iter().filter_map(|&f| local.get(f).copied().flatten()));
            }
        }
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    /// Nodes joined to `node` by an edge. Needs `EDGES | NODE_NEIGHBORS`.
    pub fn node_neighbors(&self, node: NodeId) -> Result<Vec<NodeId>, MeshError> {
        let edges = self.edge_table("node_neighbors")?;
        let mut out: Vec<NodeId> = self
            .edges_of_node(node)?
            .into_iter()
            .filter_map(|e| edges.get(e))
            .map(|e| if e.nodes[0] == node { e.nodes[1] } else { e.nodes[0] })
            .collect();
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    // --- edge ---------------------------------------------------------------

    /// End nodes of an edge, ascending. Needs `EDGES`.
    pub fn nodes_of_edge(&self, edge: EdgeId) -> Result<[NodeId; 2], MeshError> {
        Ok(self.edge("nodes_of_edge", edge)?.nodes)
    }

    /// Elements sharing an edge. Needs `EDGES`.
    pub fn elements_of_edge(&self, edge: EdgeId) -> Result<Vec<ElementId>, MeshError> {
        let e = self.edge("elements_of_edge", edge)?;
        Ok(e.half_edges
            .iter()
            .map(|h| h.element)
            .sorted_unstable()
            .dedup()
            .collect())
    }

    /// Faces bounded by an edge. Needs `EDGES | FACES`.
    pub fn faces_of_edge(&self, edge: EdgeId) -> Result<Vec<FaceId>, MeshError> {
        let e = self.edge("faces_of_edge", edge)?;
        let faces = self.face_table("faces_of_edge")?;
        let mut out = Vec::new();
        for h in &e.half_edges {
            let local = faces.of_element(h.element);
            out.extend(
                S::EDGE_FACES[h.slot as usize]
                    .iter()
                    .filter_map(|&f| local.get(f).copied().flatten()),
            );
        }
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    /// The edge joining two nodes, in either order. Needs `EDGES`.
    pub fn edge_from_nodes(&self, a: NodeId, b: NodeId) -> Result<Option<EdgeId>, MeshError> {
        Ok(self.edge_table("edge_from_nodes")?.find(a, b))
    }

    /// Midpoint of an edge. Needs `EDGES`.
    pub fn edge_center(&self, edge: EdgeId) -> Result<Point, MeshError> {
        let [a, b] = self.nodes_of_edge(edge)?;
        let points = self.geometry().points();
        Ok(centroid([points[a.index()], points[b.index()]]))
    }

    // --- face ---------------------------------------------------------------

    /// Face node loop in the winding of its first owner (3 or 4 nodes).
    /// Needs `FACES`.
    pub fn nodes_of_face(&self, face: FaceId) -> Result<Vec<NodeId>, MeshError> {
        Ok(self.face("nodes_of_face", face)?.node_loop().to_vec())
    }

    /// Edges around a face, in loop order. Needs `EDGES | FACES`.
    pub fn edges_of_face(&self, face: FaceId) -> Result<Vec<EdgeId>, MeshError> {
        let f = self.face("edges_of_face", face)?;
        let edges = self.edge_table("edges_of_face")?;
        Ok(f.node_loop()
            .iter()
            .circular_tuple_windows()
            .filter_map(|(&a, &b)| edges.find(a, b))
            .collect())
    }

    /// Owners of a face (one on the boundary, two inside). Needs `FACES`.
    pub fn elements_of_face(&self, face: FaceId) -> Result<Vec<ElementId>, MeshError> {
        Ok(self
            .face("elements_of_face", face)?
            .owners()
            .map(|h| h.element)
            .collect())
    }

    /// The face with the given node loop (any rotation or winding).
    /// Needs `FACES`.
    pub fn face_from_nodes(&self, nodes: &[NodeId]) -> Result<Option<FaceId>, MeshError> {
        Ok(self.face_table("face_from_nodes")?.find(nodes))
    }

    /// `true` when the face has a single owner. Needs `FACES`.
    pub fn is_boundary_face(&self, face: FaceId) -> Result<bool, MeshError> {
        Ok(self.face("is_boundary_face", face)?.is_boundary())
    }

    /// Average of the distinct face nodes. Needs `FACES`.
    pub fn face_center(&self, face: FaceId) -> Result<Point, MeshError> {
        let f = self.face("face_center", face)?;
        let points = self.geometry().points();
        Ok(centroid(f.node_loop().iter().map(|n| points[n.index()])))
    }

    // --- element ------------------------------------------------------------

    /// Distinct edges of an element, in local slot order. Needs `EDGES`.
    pub fn edges_of_element(&self, element: ElementId) -> Result<Vec<EdgeId>, MeshError> {
        self.element_nodes(element)?;
        let local = self.edge_table("edges_of_element")?.of_element(element);
        Ok(local.iter().flatten().copied().unique().collect())
    }

    /// Distinct faces of an element, in local slot order. Needs `FACES`.
    pub fn faces_of_element(&self, element: ElementId) -> Result<Vec<FaceId>, MeshError> {
        self.element_nodes(element)?;
        let local = self.face_table("faces_of_element")?.of_element(element);
        Ok(local.iter().flatten().copied().unique().collect())
    }

    /// Bit `k` set when local face `k` lies on the boundary. Needs `FACES`.
    pub fn boundary_mask(&self, element: ElementId) -> Result<u8, MeshError> {
        self.element_nodes(element)?;
        Ok(self
            .face_table("boundary_mask")?
            .boundary_mask(element)
            .unwrap_or(0))
    }

    /// The element across local facet `facet` of `element`: a face slot for
    /// volume elements, an edge slot for surface elements. `None` on the
    /// boundary. Needs `FACES` (volumes) or `EDGES` (surfaces).
    pub fn element_neighbor(
        &self,
        element: ElementId,
        facet: usize,
    ) -> Result<Option<ElementId>, MeshError> {
        self.element_nodes(element)?;
        if S::dimension() >= 3 {
            let faces = self.face_table("element_neighbor")?;
            let Some(id) = faces.of_element(element).get(facet).copied().flatten() else {
                return Ok(None);
            };
            Ok(faces.get(id).and_then(|f| f.opposite(element)))
        } else {
            let edges = self.edge_table("element_neighbor")?;
            let Some(id) = edges.of_element(element).get(facet).copied().flatten() else {
                return Ok(None);
            };
            Ok(edges.get(id).and_then(|e| {
                e.half_edges
                    .iter()
                    .map(|h| h.element)
                    .find(|&other| other != element)
            }))
        }
    }

    /// All elements sharing a facet with `element`, ascending.
    pub fn element_neighbors(&self, element: ElementId) -> Result<Vec<ElementId>, MeshError> {
        let facets = if S::dimension() >= 3 {
            S::FACES.len()
        } else {
            S::EDGES.len()
        };
        let mut out = Vec::with_capacity(facets);
        for facet in 0..facets {
            if let Some(n) = self.element_neighbor(element, facet)? {
                out.push(n);
            }
        }
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    /// Coordinates of a node.
    pub fn node_center(&self, node: NodeId) -> Result<Point, MeshError> {
        self.point(node)
    }

    /// Average of the element's node coordinates.
    pub fn element_center(&self, element: ElementId) -> Result<Point, MeshError> {
        let points = self.geometry().points();
        Ok(centroid(
            self.element_nodes(element)?
                .iter()
                .map(|n| points[n.index()]),
        ))
    }
}
