//! Derived topology tables: edges, faces and node-to-element incidence.
//!
//! Each table is a pure function of the [`GeometryStore`] and is built by
//! scanning the elements once, hashing every local edge/face under its
//! canonical key. Ids are assigned in first-seen order, so a given input
//! always produces the same tables.
//!
//! Non-manifold input does not abort a build: a face claimed by a third
//! element, or twice by the same element, is logged with `log::warn!` and the
//! extra claim is dropped.

use hashbrown::HashMap;

use crate::topology::canonical::{EdgeKey, FaceKey, face_slots};
use crate::topology::cell_type::ElementShape;
use crate::topology::geometry_store::GeometryStore;
use crate::topology::point::{EdgeId, ElementId, FaceId, HalfEdge, HalfFace, NodeId};

/// One canonical edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// End nodes, sorted ascending.
    pub nodes: [NodeId; 2],
    /// Every element-local occurrence of the edge.
    pub half_edges: Vec<HalfEdge>,
}

/// One canonical face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    /// Node loop, smallest id first, in the winding seen by the first owner.
    /// Triangles carry [`NodeId::DUMMY`] in the last slot.
    pub nodes: [NodeId; 4],
    owners: [Option<HalfFace>; 2],
}

impl Face {
    /// Owning half-faces (one for boundary faces, two for interior ones).
    pub fn owners(&self) -> impl Iterator<Item = HalfFace> + '_ {
        self.owners.iter().flatten().copied()
    }

    pub fn owner_count(&self) -> usize {
        self.owners.iter().flatten().count()
    }

    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.owners[1].is_none()
    }

    #[inline]
    pub fn is_triangle(&self) -> bool {
        self.nodes[3].is_dummy()
    }

    /// The distinct nodes of the face in winding order.
    pub fn node_loop(&self) -> &[NodeId] {
        if self.is_triangle() {
            &self.nodes[..3]
        } else {
            &self.nodes
        }
    }

    /// The element across this face from `element`, if any.
    pub fn opposite(&self, element: ElementId) -> Option<ElementId> {
        self.owners()
            .map(|h| h.element)
            .find(|&e| e != element)
    }
}

/// Edge table plus per-element slot lookup.
#[derive(Debug, Clone, Default)]
pub struct EdgeTable {
    edges: Vec<Edge>,
    lookup: HashMap<EdgeKey, EdgeId>,
    /// `element * edges_per_element + slot`; `None` for degenerate slots.
    element_edges: Vec<Option<EdgeId>>,
    per_element: usize,
}

impl EdgeTable {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn get(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId::from_index(i), e))
    }

    /// Edge joining `a` and `b`, in either order.
    pub fn find(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        EdgeKey::new(a, b).and_then(|k| self.lookup.get(&k).copied())
    }

    /// Edge ids of one element, by local slot.
    pub fn of_element(&self, element: ElementId) -> &[Option<EdgeId>] {
        let start = element.index() * self.per_element;
        self.element_edges
            .get(start..start + self.per_element)
            .unwrap_or(&[])
    }
}

/// Face table plus per-element slot lookup and boundary bitmask.
#[derive(Debug, Clone, Default)]
pub struct FaceTable {
    faces: Vec<Face>,
    lookup: HashMap<FaceKey, FaceId>,
    element_faces: Vec<Option<FaceId>>,
    boundary: Vec<u8>,
    per_element: usize,
}

impl FaceTable {
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn get(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id.index())
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (FaceId, &Face)> + '_ {
        self.faces
            .iter()
            .enumerate()
            .map(|(i, f)| (FaceId::from_index(i), f))
    }

    /// Face with the given node loop (3 or 4 nodes, any rotation or winding).
    pub fn find(&self, nodes: &[NodeId]) -> Option<FaceId> {
        let (key, _) = FaceKey::new(face_slots(nodes)?)?;
        self.lookup.get(&key).copied()
    }

    /// Face ids of one element, by local slot.
    pub fn of_element(&self, element: ElementId) -> &[Option<FaceId>] {
        let start = element.index() * self.per_element;
        self.element_faces
            .get(start..start + self.per_element)
            .unwrap_or(&[])
    }

    /// Bit `k` is set when local face `k` of `element` has a single owner.
    pub fn boundary_mask(&self, element: ElementId) -> Option<u8> {
        self.boundary.get(element.index()).copied()
    }
}

/// Node to incident-element table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeNeighbors {
    elements: Vec<Vec<ElementId>>,
}

impl NodeNeighbors {
    /// Elements using `node`, sorted ascending.
    pub fn of_node(&self, node: NodeId) -> &[ElementId] {
        self.elements
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Builds the edge table.
pub fn compute_edges<S: ElementShape>(geom: &GeometryStore<S>) -> EdgeTable {
    let per_element = S::EDGES.len();
    let mut table = EdgeTable {
        edges: Vec::new(),
        lookup: HashMap::with_capacity(geom.element_count() * per_element / 2),
        element_edges: Vec::with_capacity(geom.element_count() * per_element),
        per_element,
    };

    for (element, nodes) in geom.elements() {
        for (slot, &[a, b]) in S::EDGES.iter().enumerate() {
            let Some(key) = EdgeKey::new(nodes[a], nodes[b]) else {
                table.element_edges.push(None);
                continue;
            };
            let half = HalfEdge::new(element, slot as u8);
            let id = *table.lookup.entry(key).or_insert_with(|| {
                table.edges.push(Edge {
                    nodes: key.nodes(),
                    half_edges: Vec::with_capacity(4),
                });
                EdgeId::from_index(table.edges.len() - 1)
            });
            table.edges[id.index()].half_edges.push(half);
            table.element_edges.push(Some(id));
        }
    }

    log::debug!(
        "compute_edges: {} edges over {} elements",
        table.edges.len(),
        geom.element_count()
    );
    table
}

/// Builds the face table and the per-element boundary bitmask.
pub fn compute_faces<S: ElementShape>(geom: &GeometryStore<S>) -> FaceTable {
    let per_element = S::FACES.len();
    let mut table = FaceTable {
        faces: Vec::new(),
        lookup: HashMap::with_capacity(geom.element_count() * per_element / 2),
        element_faces: Vec::with_capacity(geom.element_count() * per_element),
        boundary: Vec::with_capacity(geom.element_count()),
        per_element,
    };

    let mut loop_nodes = [NodeId::DUMMY; 4];
    for (element, nodes) in geom.elements() {
        for (slot, local) in S::FACES.iter().enumerate() {
            loop_nodes[3] = NodeId::DUMMY;
            for (k, &l) in local.iter().enumerate() {
                loop_nodes[k] = nodes[l];
            }
            let Some((key, ordered)) = FaceKey::new(loop_nodes) else {
                table.element_faces.push(None);
                continue;
            };
            let half = HalfFace::new(element, slot as u8);
            let id = hash_face(&mut table, key, ordered, half);
            table.element_faces.push(Some(id));
        }
    }

    for element in geom.element_ids() {
        let mut mask = 0u8;
        for (slot, face) in table.of_element(element).iter().enumerate() {
            if let Some(f) = face {
                if table.faces[f.index()].is_boundary() {
                    mask |= 1 << slot;
                }
            }
        }
        table.boundary.push(mask);
    }

    log::debug!(
        "compute_faces: {} faces over {} elements",
        table.faces.len(),
        geom.element_count()
    );
    table
}

fn hash_face(table: &mut FaceTable, key: FaceKey, ordered: [NodeId; 4], half: HalfFace) -> FaceId {
    if let Some(&id) = table.lookup.get(&key) {
        let face = &mut table.faces[id.index()];
        match face.owners {
            [Some(_), Some(_)] => {
                log::warn!(
                    "non-manifold face {:?}: already shared, dropping claim by element {}",
                    face.node_loop(),
                    half.element
                );
            }
            [Some(first), None] if first.element == half.element => {
                log::warn!(
                    "element {} uses face {:?} twice, dropping local face {}",
                    half.element,
                    face.node_loop(),
                    half.slot
                );
            }
            _ => face.owners[1] = Some(half),
        }
        return id;
    }

    table.faces.push(Face {
        nodes: ordered,
        owners: [Some(half), None],
    });
    let id = FaceId::from_index(table.faces.len() - 1);
    table.lookup.insert(key, id);
    id
}

/// Builds the node-to-element incidence table.
pub fn compute_node_neighbors<S: ElementShape>(geom: &GeometryStore<S>) -> NodeNeighbors {
    let mut elements = vec![Vec::new(); geom.node_count()];
    for (element, nodes) in geom.elements() {
        for node in nodes {
            let list: &mut Vec<ElementId> = &mut elements[node.index()];
            // elements arrive in id order, so a repeated node only repeats the tail
            if list.last() != Some(&element) {
                list.push(element);
            }
        }
    }
    log::debug!("compute_node_neighbors: {} nodes", elements.len());
    NodeNeighbors { elements }
}
