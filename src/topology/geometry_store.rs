//! Raw mesh geometry: the point array and the flat element-to-node array.
//!
//! This is the single source of truth of a mesh. Everything else (edges,
//! faces, adjacency, bounding boxes, search grids) is derived from it.

use std::marker::PhantomData;

use crate::geometry::vector::Point;
use crate::mesh_error::MeshError;
use crate::topology::cell_type::ElementShape;
use crate::topology::point::{ElementId, NodeId};

/// Points plus fixed-arity connectivity for one element family.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryStore<S: ElementShape> {
    points: Vec<Point>,
    element_nodes: Vec<NodeId>,
    _shape: PhantomData<S>,
}

impl<S: ElementShape> Default for GeometryStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ElementShape> GeometryStore<S> {
    pub fn new() -> Self {
        GeometryStore {
            points: Vec::new(),
            element_nodes: Vec::new(),
            _shape: PhantomData,
        }
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn element_count(&self) -> usize {
        self.element_nodes.len() / S::ARITY
    }

    pub fn reserve_nodes(&mut self, additional: usize) {
        self.points.reserve(additional);
    }

    pub fn reserve_elements(&mut self, additional: usize) {
        self.element_nodes.reserve(additional * S::ARITY);
    }

    /// Appends a point and returns its id.
    pub fn add_point(&mut self, p: Point) -> NodeId {
        self.points.push(p);
        NodeId::from_index(self.points.len() - 1)
    }

    /// Grows the point array to `n` entries, filling with the origin.
    /// Never shrinks.
    pub fn resize_points(&mut self, n: usize) {
        if n > self.points.len() {
            self.points.resize(n, [0.0; 3]);
        }
    }

    /// Appends an element.
    ///
    /// # Errors
    /// [`MeshError::ArityMismatch`] if `nodes.len()` differs from the family's
    /// arity, [`MeshError::NodeOutOfRange`] if any id is not an existing node.
    pub fn add_element(&mut self, nodes: &[NodeId]) -> Result<ElementId, MeshError> {
        if nodes.len() != S::ARITY {
            return Err(MeshError::ArityMismatch {
                expected: S::ARITY,
                found: nodes.len(),
            });
        }
        self.check_nodes(nodes)?;
        let id = ElementId::from_index(self.element_count());
        self.element_nodes.extend_from_slice(nodes);
        Ok(id)
    }

    fn check_nodes(&self, nodes: &[NodeId]) -> Result<(), MeshError> {
        let len = self.points.len();
        match nodes.iter().find(|n| n.index() >= len) {
            Some(&node) => Err(MeshError::NodeOutOfRange { node, len }),
            None => Ok(()),
        }
    }

    /// Coordinates of `node`.
    pub fn point(&self, node: NodeId) -> Result<Point, MeshError> {
        self.points
            .get(node.index())
            .copied()
            .ok_or(MeshError::NodeOutOfRange {
                node,
                len: self.points.len(),
            })
    }

    /// Moves an existing node. Derived tables are *not* invalidated.
    pub fn set_point(&mut self, node: NodeId, p: Point) -> Result<(), MeshError> {
        let len = self.points.len();
        let slot = self
            .points
            .get_mut(node.index())
            .ok_or(MeshError::NodeOutOfRange { node, len })?;
        *slot = p;
        Ok(())
    }

    /// Node ids of `element`, in local order.
    pub fn element_nodes(&self, element: ElementId) -> Result<&[NodeId], MeshError> {
        if element.index() >= self.element_count() {
            return Err(MeshError::ElementOutOfRange {
                element,
                len: self.element_count(),
            });
        }
        let start = element.index() * S::ARITY;
        Ok(&self.element_nodes[start..start + S::ARITY])
    }

    /// Node coordinates of `element`, in local order.
    pub fn element_points(&self, element: ElementId) -> Result<Vec<Point>, MeshError> {
        self.element_nodes(element)?
            .iter()
            .map(|&n| self.point(n))
            .collect()
    }

    /// Iterates `(element, nodes)` in id order.
    pub fn elements(&self) -> impl ExactSizeIterator<Item = (ElementId, &[NodeId])> + '_ {
        self.element_nodes
            .chunks_exact(S::ARITY)
            .enumerate()
            .map(|(i, nodes)| (ElementId::from_index(i), nodes))
    }

    pub fn node_ids(&self) -> impl ExactSizeIterator<Item = NodeId> {
        (0..self.points.len()).map(NodeId::from_index)
    }

    pub fn element_ids(&self) -> impl ExactSizeIterator<Item = ElementId> {
        (0..self.element_count()).map(ElementId::from_index)
    }

    /// All points, indexed by node id.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Flat connectivity, `arity` ids per element.
    pub fn element_nodes_raw(&self) -> &[NodeId] {
        &self.element_nodes
    }

    /// Replaces every point. Fails if existing connectivity would dangle.
    pub fn set_points(&mut self, points: Vec<Point>) -> Result<(), MeshError> {
        let len = points.len();
        if let Some(&node) = self.element_nodes.iter().find(|n| n.index() >= len) {
            return Err(MeshError::NodeOutOfRange { node, len });
        }
        self.points = points;
        Ok(())
    }

    /// Replaces the connectivity with a flat array of `arity`-sized records.
    pub fn set_element_nodes_raw(&mut self, nodes: Vec<NodeId>) -> Result<(), MeshError> {
        if nodes.len() % S::ARITY != 0 {
            return Err(MeshError::RaggedConnectivity {
                len: nodes.len(),
                arity: S::ARITY,
            });
        }
        self.check_nodes(&nodes)?;
        self.element_nodes = nodes;
        Ok(())
    }

    /// Applies `f` to every point.
    pub fn map_points(&mut self, mut f: impl FnMut(Point) -> Point) {
        for p in &mut self.points {
            *p = f(*p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::cell_type::QuadShape;

    fn unit_square() -> GeometryStore<QuadShape> {
        let mut g = GeometryStore::new();
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]] {
            g.add_point(p);
        }
        g
    }

    #[test]
    fn add_element_checks_arity_and_ids() {
        let mut g = unit_square();
        let ids: Vec<NodeId> = (0..4).map(NodeId::new).collect();
        assert_eq!(g.add_element(&ids).unwrap(), ElementId::new(0));
        assert_eq!(
            g.add_element(&ids[..3]),
            Err(MeshError::ArityMismatch { expected: 4, found: 3 })
        );
        let bad = [NodeId::new(0), NodeId::new(1), NodeId::new(2), NodeId::new(9)];
        assert_eq!(
            g.add_element(&bad),
            Err(MeshError::NodeOutOfRange { node: NodeId::new(9), len: 4 })
        );
        assert_eq!(g.element_count(), 1);
    }

    #[test]
    fn set_point_and_bounds() {
        let mut g = unit_square();
        g.set_point(NodeId::new(2), [2.0, 2.0, 0.0]).unwrap();
        assert_eq!(g.point(NodeId::new(2)).unwrap(), [2.0, 2.0, 0.0]);
        assert!(g.point(NodeId::new(4)).is_err());
        assert!(g.set_point(NodeId::new(4), [0.0; 3]).is_err());
    }

    #[test]
    fn raw_connectivity_is_validated() {
        let mut g = unit_square();
        let err = g
            .set_element_nodes_raw(vec![NodeId::new(0); 5])
            .unwrap_err();
        assert_eq!(err, MeshError::RaggedConnectivity { len: 5, arity: 4 });
        g.set_element_nodes_raw((0..4).map(NodeId::new).collect())
            .unwrap();
        assert!(g.set_points(vec![[0.0; 3]; 2]).is_err());
        assert_eq!(g.elements().len(), 1);
    }

    #[test]
    fn resize_points_never_shrinks() {
        let mut g = unit_square();
        g.resize_points(2);
        assert_eq!(g.node_count(), 4);
        g.resize_points(6);
        assert_eq!(g.point(NodeId::new(5)).unwrap(), [0.0; 3]);
    }
}
