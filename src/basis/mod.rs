//! Interpolation basis interface consumed by the mesh.
//!
//! The mesh never evaluates shape functions itself. Point location, element
//! measures and the refinement step of closest-element queries go through a
//! [`Basis`] implementation, which sees one element at a time through a
//! borrowed [`ElementContext`].

pub mod linear;

pub use linear::LinearLagrange;

use crate::geometry::vector::Point;
use crate::topology::cell_type::ElementShape;
use crate::topology::geometry_store::GeometryStore;
use crate::topology::point::{EdgeId, ElementId, NodeId};

/// Reference-element coordinates. Unused trailing components are zero.
pub type LocalCoords = [f64; 3];

/// Derivative of the reference-to-physical map; `jac[r]` is the physical
/// vector `dx/dxi_r`. Surface elements store their unit normal in `jac[2]`.
pub type Jacobian = [[f64; 3]; 3];

/// Read-only view of one element handed to a [`Basis`].
#[derive(Debug, Clone, Copy)]
pub struct ElementContext<'a, S: ElementShape> {
    geometry: &'a GeometryStore<S>,
    element: ElementId,
    nodes: &'a [NodeId],
    epsilon: f64,
    edges: Option<&'a [Option<EdgeId>]>,
}

impl<'a, S: ElementShape> ElementContext<'a, S> {
    /// Context for `element`, or `None` if the element does not exist.
    pub fn new(geometry: &'a GeometryStore<S>, element: ElementId, epsilon: f64) -> Option<Self> {
        let nodes = geometry.element_nodes(element).ok()?;
        Some(ElementContext {
            geometry,
            element,
            nodes,
            epsilon,
            edges: None,
        })
    }

    /// Attaches the element's edge ids (needed by higher-order bases).
    pub fn with_edges(mut self, edges: &'a [Option<EdgeId>]) -> Self {
        self.edges = Some(edges);
        self
    }

    #[inline]
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// Global id of local node `k`.
    #[inline]
    pub fn node_index(&self, k: usize) -> NodeId {
        self.nodes[k]
    }

    /// Coordinates of local node `k`.
    #[inline]
    pub fn node(&self, k: usize) -> Point {
        self.geometry.points()[self.nodes[k].index()]
    }

    /// All node coordinates, in local order.
    pub fn points(&self) -> impl ExactSizeIterator<Item = Point> + '_ {
        (0..self.nodes.len()).map(move |k| self.node(k))
    }

    /// Mesh tolerance (bounding-box diagonal times the configured scale).
    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Global id of local edge `k`, when edges were attached and the edge is
    /// not degenerate.
    pub fn edge_index(&self, k: usize) -> Option<EdgeId> {
        self.edges.and_then(|e| e.get(k).copied().flatten())
    }
}

/// Shape-function strategy for an element family.
pub trait Basis<S: ElementShape>: Send + Sync {
    /// Polynomial order of the geometry; above 1 the mesh delegates point
    /// location entirely to [`Basis::locate`].
    fn polynomial_order(&self) -> u32 {
        1
    }

    /// Local coordinates of `p` when it lies in the element.
    fn get_coords(&self, p: Point, ctx: &ElementContext<'_, S>) -> Option<LocalCoords>;

    /// Local coordinates of `p`, pulled back into the reference element when
    /// `p` lies slightly outside. Used to refine closest points found on
    /// element faces. Defaults to [`Basis::get_coords`].
    fn project(&self, p: Point, ctx: &ElementContext<'_, S>) -> Option<LocalCoords> {
        self.get_coords(p, ctx)
    }

    /// Maps local coordinates to a physical point.
    fn interpolate(&self, coords: LocalCoords, ctx: &ElementContext<'_, S>) -> Point;

    /// Jacobian of the map at `coords`.
    fn derivate(&self, coords: LocalCoords, ctx: &ElementContext<'_, S>) -> Jacobian;

    /// Volume (area for surface elements).
    fn get_volume(&self, ctx: &ElementContext<'_, S>) -> f64;

    /// First candidate containing `p`, with its local coordinates.
    fn locate<'a, I>(&self, p: Point, candidates: I) -> Option<(ElementId, LocalCoords)>
    where
        I: IntoIterator<Item = ElementContext<'a, S>>,
        S: 'a,
    {
        candidates
            .into_iter()
            .find_map(|ctx| self.get_coords(p, &ctx).map(|c| (ctx.element(), c)))
    }
}
