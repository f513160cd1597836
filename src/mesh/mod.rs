//! The mesh owner type.
//!
//! [`Mesh`] couples a [`GeometryStore`] (points and element connectivity,
//! the only state a user edits) with the tables derived from it: edges,
//! faces, node-to-element incidence, the bounding volume and the two search
//! grids. Derived tables are built lazily through the mesh's
//! [`Coordinator`], each exactly once, and are stored in write-once cells so
//! readers never lock.
//!
//! Adjacency queries live in [`crate::topology::adjacency`], spatial queries
//! in [`crate::algs::locate`]; both are inherent methods of [`Mesh`].

pub mod data;
mod measure;

use once_cell::sync::OnceCell;

use crate::basis::{Basis, ElementContext, Jacobian, LinearLagrange, LocalCoords};
use crate::geometry::bbox::BBox;
use crate::geometry::search_grid::SearchGrid;
use crate::geometry::vector::Point;
use crate::mesh_error::{MeshError, PreconditionError};
use crate::sync::{Coordinator, Dispatch, Table, TableMask, expand};
use crate::topology::cache::InvalidateCache;
use crate::topology::cell_type::{ElementShape, HexShape, PrismShape, QuadShape};
use crate::topology::geometry_store::GeometryStore;
use crate::topology::index::{
    EdgeTable, FaceTable, NodeNeighbors, compute_edges, compute_faces, compute_node_neighbors,
};
use crate::topology::point::{ElementId, NodeId};

/// Tuning knobs of a mesh.
///
/// ```
/// use mesh_locate::mesh::MeshConfig;
/// use mesh_locate::sync::Dispatch;
///
/// let cfg = MeshConfig {
///     dispatch: Dispatch::Sequential,
///     ..Default::default()
/// };
/// assert_eq!(cfg.epsilon_scale, 1e-8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshConfig {
    /// How `synchronize` runs several pending builders.
    pub dispatch: Dispatch,
    /// Mesh epsilon as a fraction of the bounding-box diagonal.
    pub epsilon_scale: f64,
    /// Search-grid padding, in epsilons.
    pub grid_padding: f64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        MeshConfig {
            dispatch: Dispatch::default(),
            epsilon_scale: 1e-8,
            grid_padding: 10.0,
        }
    }
}

/// Bounding box of all nodes plus the tolerance derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingVolume {
    pub bbox: BBox,
    /// `bbox` diagonal length times [`MeshConfig::epsilon_scale`].
    pub epsilon: f64,
}

impl BoundingVolume {
    #[inline]
    pub fn epsilon2(&self) -> f64 {
        self.epsilon * self.epsilon
    }
}

/// Node search grid. Nodes appended after the build are not in the grid;
/// `indexed` is the node count at build time.
#[derive(Debug)]
pub(crate) struct NodeGrid {
    pub(crate) grid: SearchGrid<NodeId>,
    pub(crate) indexed: usize,
}

#[derive(Debug, Default)]
struct DerivedTables {
    edges: OnceCell<EdgeTable>,
    faces: OnceCell<FaceTable>,
    node_neighbors: OnceCell<NodeNeighbors>,
    bounding: OnceCell<BoundingVolume>,
    node_grid: OnceCell<NodeGrid>,
    elem_grid: OnceCell<SearchGrid<ElementId>>,
}

/// An unstructured mesh of one element family.
///
/// `S` fixes the element shape (and with it the arity and the static
/// edge/face tables), `B` the interpolation basis used for point location
/// and element measures.
#[derive(Debug)]
pub struct Mesh<S: ElementShape, B: Basis<S>> {
    geometry: GeometryStore<S>,
    basis: B,
    config: MeshConfig,
    coordinator: Coordinator,
    tables: DerivedTables,
}

/// Trilinear hexahedral volume mesh.
pub type HexVolMesh = Mesh<HexShape, LinearLagrange>;
/// Linear prism volume mesh.
pub type PrismVolMesh = Mesh<PrismShape, LinearLagrange>;
/// Bilinear quadrilateral surface mesh.
pub type QuadSurfMesh = Mesh<QuadShape, LinearLagrange>;

impl<S: ElementShape, B: Basis<S> + Default> Default for Mesh<S, B> {
    fn default() -> Self {
        Self::with_basis(B::default())
    }
}

impl<S: ElementShape, B: Basis<S> + Default> Mesh<S, B> {
    /// Empty mesh with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty mesh with a custom configuration.
    pub fn with_config(config: MeshConfig) -> Self {
        Self::with_basis(B::default()).configured(config)
    }
}

impl<S: ElementShape, B: Basis<S>> Mesh<S, B> {
    /// Empty mesh using `basis`.
    pub fn with_basis(basis: B) -> Self {
        Mesh {
            geometry: GeometryStore::new(),
            basis,
            config: MeshConfig::default(),
            coordinator: Coordinator::new(),
            tables: DerivedTables::default(),
        }
    }

    /// Replaces the configuration. Present tables keep the epsilon they were
    /// built with until the next `clear_synchronization`.
    pub fn configured(mut self, config: MeshConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    pub fn basis(&self) -> &B {
        &self.basis
    }

    /// Raw points and connectivity.
    pub fn geometry(&self) -> &GeometryStore<S> {
        &self.geometry
    }

    // --- raw geometry -----------------------------------------------------

    pub fn node_count(&self) -> usize {
        self.geometry.node_count()
    }

    pub fn element_count(&self) -> usize {
        self.geometry.element_count()
    }

    pub fn reserve_nodes(&mut self, additional: usize) {
        self.geometry.reserve_nodes(additional);
    }

    pub fn reserve_elements(&mut self, additional: usize) {
        self.geometry.reserve_elements(additional);
    }

    /// Appends a node. Derived tables are left as they are; the node grid
    /// keeps answering for the new node through a linear fallback.
    pub fn add_point(&mut self, p: Point) -> NodeId {
        self.geometry.add_point(p)
    }

    /// Grows the point array to `n` nodes, padding with the origin.
    pub fn resize_points(&mut self, n: usize) {
        self.geometry.resize_points(n);
    }

    /// Appends an element. Fails on an arity mismatch or unknown node ids.
    /// Derived tables are not updated; call
    /// [`clear_synchronization`](Self::clear_synchronization) once the
    /// connectivity is final.
    pub fn add_element(&mut self, nodes: &[NodeId]) -> Result<ElementId, MeshError> {
        self.geometry.add_element(nodes)
    }

    pub fn point(&self, node: NodeId) -> Result<Point, MeshError> {
        self.geometry.point(node)
    }

    /// Moves a node. Does not invalidate derived tables.
    pub fn set_point(&mut self, node: NodeId, p: Point) -> Result<(), MeshError> {
        self.geometry.set_point(node, p)
    }

    pub fn element_nodes(&self, element: ElementId) -> Result<&[NodeId], MeshError> {
        self.geometry.element_nodes(element)
    }

    /// Applies `f` to every point, then drops all derived tables.
    pub fn transform(&mut self, f: impl FnMut(Point) -> Point) {
        self.geometry.map_points(f);
        self.clear_synchronization();
    }

    // --- synchronization --------------------------------------------------

    /// Builds every table `mask` needs (macro bits included) and blocks until
    /// they are present.
    pub fn synchronize(&self, mask: TableMask) -> Result<(), MeshError> {
        let requested = expand(mask, S::dimension());
        self.coordinator
            .synchronize(requested, self.config.dispatch, |t| self.build_table(t))
    }

    /// Documented no-op; tables are only dropped by
    /// [`clear_synchronization`](Self::clear_synchronization).
    pub fn unsynchronize(&self, mask: TableMask) -> bool {
        self.coordinator.unsynchronize(mask)
    }

    /// Drops every derived table and any poison. Raw geometry is kept.
    pub fn clear_synchronization(&mut self) {
        self.tables = DerivedTables::default();
        self.coordinator.clear();
        log::debug!("synchronization cleared");
    }

    /// `true` when every table in `mask` (after macro expansion) is present.
    pub fn is_synchronized(&self, mask: TableMask) -> bool {
        self.coordinator
            .is_synchronized(expand(mask, S::dimension()) | (mask & TableMask::RAW))
    }

    /// How many times the builder of `table` has run on this mesh.
    pub fn build_count(&self, table: Table) -> usize {
        self.coordinator.build_count(table)
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    fn build_table(&self, table: Table) -> Result<(), MeshError> {
        match table {
            Table::Edges => {
                let edges = self
                    .tables
                    .edges
                    .get_or_init(|| compute_edges(&self.geometry));
                log::debug!("edge table: {} edges", edges.len());
            }
            Table::Faces => {
                let faces = self
                    .tables
                    .faces
                    .get_or_init(|| compute_faces(&self.geometry));
                log::debug!("face table: {} faces", faces.len());
            }
            Table::NodeNeighbors => {
                self.tables
                    .node_neighbors
                    .get_or_init(|| compute_node_neighbors(&self.geometry));
            }
            Table::BoundingBox => {
                let bv = self
                    .tables
                    .bounding
                    .get_or_init(|| self.compute_bounding_volume());
                log::debug!("bounding box {:?}, epsilon {:e}", bv.bbox, bv.epsilon);
            }
            Table::NodeLocateGrid => {
                let bv = *self.bounding_volume("build node grid")?;
                self.tables
                    .node_grid
                    .get_or_init(|| self.compute_node_grid(&bv));
            }
            Table::ElemLocateGrid => {
                let bv = *self.bounding_volume("build element grid")?;
                self.tables
                    .elem_grid
                    .get_or_init(|| self.compute_elem_grid(&bv));
            }
        }
        Ok(())
    }

    fn compute_bounding_volume(&self) -> BoundingVolume {
        let bbox = BBox::of_points(self.geometry.points());
        let epsilon = if bbox.is_valid() {
            bbox.diagonal_length() * self.config.epsilon_scale
        } else {
            0.0
        };
        BoundingVolume { bbox, epsilon }
    }

    fn compute_node_grid(&self, bv: &BoundingVolume) -> NodeGrid {
        let count = self.geometry.node_count();
        let mut grid = SearchGrid::sized_for(&bv.bbox, count, self.config.grid_padding * bv.epsilon);
        for (i, p) in self.geometry.points().iter().enumerate() {
            grid.insert_point(NodeId::from_index(i), *p);
        }
        NodeGrid {
            grid,
            indexed: count,
        }
    }

    fn compute_elem_grid(&self, bv: &BoundingVolume) -> SearchGrid<ElementId> {
        let mut grid = SearchGrid::sized_for(
            &bv.bbox,
            self.geometry.element_count(),
            self.config.grid_padding * bv.epsilon,
        );
        for (element, _) in self.geometry.elements() {
            grid.insert_box(element, &self.element_bbox(element).padded(bv.epsilon));
        }
        grid
    }

    // --- derived table access ---------------------------------------------

    /// The edge table, if synchronized.
    pub fn edge_table(&self, operation: &'static str) -> Result<&EdgeTable, PreconditionError> {
        self.tables.edges.get().ok_or(PreconditionError {
            operation,
            missing: TableMask::EDGES,
        })
    }

    /// The face table, if synchronized.
    pub fn face_table(&self, operation: &'static str) -> Result<&FaceTable, PreconditionError> {
        self.tables.faces.get().ok_or(PreconditionError {
            operation,
            missing: TableMask::FACES,
        })
    }

    /// The node-to-element table, if synchronized.
    pub fn node_neighbor_table(
        &self,
        operation: &'static str,
    ) -> Result<&NodeNeighbors, PreconditionError> {
        self.tables.node_neighbors.get().ok_or(PreconditionError {
            operation,
            missing: TableMask::NODE_NEIGHBORS,
        })
    }

    /// Bounding box and epsilon, if synchronized.
    pub fn bounding_volume(
        &self,
        operation: &'static str,
    ) -> Result<&BoundingVolume, PreconditionError> {
        self.tables.bounding.get().ok_or(PreconditionError {
            operation,
            missing: TableMask::BOUNDING_BOX,
        })
    }

    /// Mesh tolerance; synchronizes the bounding box on demand.
    pub fn epsilon(&self) -> Result<f64, MeshError> {
        self.synchronize(TableMask::BOUNDING_BOX)?;
        Ok(self.bounding_volume("epsilon")?.epsilon)
    }

    /// Bounding box of all nodes; synchronizes it on demand.
    pub fn bounding_box(&self) -> Result<BBox, MeshError> {
        self.synchronize(TableMask::BOUNDING_BOX)?;
        Ok(self.bounding_volume("bounding_box")?.bbox)
    }

    pub(crate) fn node_grid(&self, operation: &'static str) -> Result<&NodeGrid, PreconditionError> {
        self.tables.node_grid.get().ok_or(PreconditionError {
            operation,
            missing: TableMask::NODE_LOCATE,
        })
    }

    pub(crate) fn elem_grid(
        &self,
        operation: &'static str,
    ) -> Result<&SearchGrid<ElementId>, PreconditionError> {
        self.tables.elem_grid.get().ok_or(PreconditionError {
            operation,
            missing: TableMask::ELEM_LOCATE,
        })
    }

    // --- per-element geometry ---------------------------------------------

    /// Bounding box of one element's nodes (empty for an unknown id).
    pub fn element_bbox(&self, element: ElementId) -> BBox {
        match self.geometry.element_nodes(element) {
            Ok(nodes) => {
                let points = self.geometry.points();
                BBox::from_points(nodes.iter().map(|n| points[n.index()]))
            }
            Err(_) => BBox::empty(),
        }
    }

    /// Basis view of `element`, with the current epsilon and, when the edge
    /// table is present, its edge ids.
    pub fn element_context(&self, element: ElementId) -> Result<ElementContext<'_, S>, MeshError> {
        let epsilon = self.epsilon()?;
        let ctx = ElementContext::new(&self.geometry, element, epsilon).ok_or(
            MeshError::ElementOutOfRange {
                element,
                len: self.geometry.element_count(),
            },
        )?;
        Ok(match self.tables.edges.get() {
            Some(edges) => ctx.with_edges(edges.of_element(element)),
            None => ctx,
        })
    }

    /// Volume of a volume element, area of a surface element.
    pub fn element_volume(&self, element: ElementId) -> Result<f64, MeshError> {
        let ctx = self.element_context(element)?;
        Ok(self.basis.get_volume(&ctx))
    }

    /// Jacobian of `element` at local coordinates `coords`.
    pub fn jacobian_at(&self, element: ElementId, coords: LocalCoords) -> Result<Jacobian, MeshError> {
        let ctx = self.element_context(element)?;
        Ok(self.basis.derivate(coords, &ctx))
    }

    /// Physical point of `element` at local coordinates `coords`.
    pub fn interpolate_in(&self, element: ElementId, coords: LocalCoords) -> Result<Point, MeshError> {
        let ctx = self.element_context(element)?;
        Ok(self.basis.interpolate(coords, &ctx))
    }

    pub(crate) fn geometry_mut(&mut self) -> &mut GeometryStore<S> {
        &mut self.geometry
    }
}

impl<S: ElementShape, B: Basis<S>> InvalidateCache for Mesh<S, B> {
    fn invalidate_cache(&mut self) {
        self.clear_synchronization();
    }
}
