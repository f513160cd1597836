//! Spatial queries: point location and nearest node / element.
//!
//! Every query synchronizes the tables it needs before touching them, so
//! these methods can be called on a freshly built mesh. Searches run over
//! the uniform search grids: nodes are bucketed by position, elements by
//! their (epsilon-padded) bounding boxes. Nearest-entity searches expand
//! ring by ring around the query point and stop once a full ring cannot hold
//! anything closer than the best candidate so far.
//!
//! "Not found" is never an error: it is reported as `None` or an empty
//! `Vec`.

use std::ops::ControlFlow;

use crate::basis::{Basis, ElementContext, LocalCoords};
use crate::geometry::bbox::BBox;
use crate::geometry::closest::{
    closest_point_on_segment, closest_point_on_triangle, est_closest_point_on_quad,
};
use crate::geometry::vector::{Point, add, distance2, sub};
use crate::mesh::{BoundingVolume, Mesh};
use crate::mesh_error::MeshError;
use crate::sync::TableMask;
use crate::topology::cell_type::ElementShape;
use crate::topology::index::FaceTable;
use crate::topology::point::{EdgeId, ElementId, FaceId, NodeId};

/// Result of a nearest-node query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestNode {
    pub node: NodeId,
    /// Coordinates of `node`.
    pub point: Point,
    /// Euclidean distance from the query point.
    pub distance: f64,
}

/// Result of a nearest-element query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestElement {
    pub element: ElementId,
    /// Closest point of `element` (the query point itself when inside).
    pub point: Point,
    /// Local coordinates of `point` in `element`; `None` when the basis
    /// cannot pull the point back.
    pub coords: Option<LocalCoords>,
    /// Euclidean distance from the query point.
    pub distance: f64,
}

/// Linear pass over `points[from..]`, tightening `dmin`.
fn scan_nodes(points: &[Point], from: usize, p: Point, dmin: &mut f64, found: &mut Option<NodeId>) {
    for (i, &q) in points.iter().enumerate().skip(from) {
        let d = distance2(q, p);
        if d < *dmin {
            *dmin = d;
            *found = Some(NodeId::from_index(i));
        }
    }
}

/// Squared search radius for a user-facing distance; negative means
/// unlimited.
fn radius2(max_distance: f64) -> f64 {
    if max_distance < 0.0 {
        f64::MAX
    } else {
        max_distance * max_distance
    }
}

impl<S: ElementShape, B: Basis<S>> Mesh<S, B> {
    // --- nodes --------------------------------------------------------------

    /// Shell search over the node grid, plus a linear pass over nodes
    /// appended after the grid was built.
    fn nearest_node(
        &self,
        operation: &'static str,
        p: Point,
        limit2: f64,
    ) -> Result<Option<ClosestNode>, MeshError> {
        self.synchronize(TableMask::NODE_LOCATE)?;
        let eps2 = self.bounding_volume(operation)?.epsilon2();
        let node_grid = self.node_grid(operation)?;
        let points = self.geometry().points();

        let mut found = None;
        let mut dmin = node_grid.grid.shell_search(p, limit2, |cell, mut dmin| {
            for &node in cell {
                let d = distance2(points[node.index()], p);
                if d < dmin {
                    dmin = d;
                    found = Some(node);
                    if dmin < eps2 {
                        return ControlFlow::Break(dmin);
                    }
                }
            }
            ControlFlow::Continue(dmin)
        });
        if dmin >= eps2 {
            scan_nodes(points, node_grid.indexed, p, &mut dmin, &mut found);
        }
        Ok(found.map(|node| ClosestNode {
            node,
            point: points[node.index()],
            distance: dmin.sqrt(),
        }))
    }

    /// The node closest to `p`; `None` only for a mesh without nodes.
    pub fn locate_node(&self, p: Point) -> Result<Option<NodeId>, MeshError> {
        Ok(self
            .nearest_node("locate_node", p, f64::MAX)?
            .map(|c| c.node))
    }

    /// The node closest to `p` and strictly within `max_distance` of it
    /// (negative for no limit).
    pub fn find_closest_node(
        &self,
        p: Point,
        max_distance: f64,
    ) -> Result<Option<ClosestNode>, MeshError> {
        self.nearest_node("find_closest_node", p, radius2(max_distance))
    }

    /// Every node strictly within `radius` of `p` (negative for all nodes),
    /// nearest first.
    pub fn find_closest_nodes(&self, p: Point, radius: f64) -> Result<Vec<ClosestNode>, MeshError> {
        self.synchronize(TableMask::NODE_LOCATE)?;
        let node_grid = self.node_grid("find_closest_nodes")?;
        let points = self.geometry().points();
        let r2 = radius2(radius);

        let mut out = Vec::new();
        let mut consider = |node: NodeId| {
            let q = points[node.index()];
            let d = distance2(q, p);
            if d < r2 {
                out.push(ClosestNode {
                    node,
                    point: q,
                    distance: d.sqrt(),
                });
            }
        };
        if radius < 0.0 {
            (0..points.len()).map(NodeId::from_index).for_each(&mut consider);
        } else {
            let reach = [radius; 3];
            let window = BBox::new(sub(p, reach), add(p, reach));
            for ijk in node_grid.grid.cells_overlapping(&window) {
                node_grid.grid.lookup_ijk(ijk).iter().copied().for_each(&mut consider);
            }
            (node_grid.indexed..points.len())
                .map(NodeId::from_index)
                .for_each(&mut consider);
        }

        out.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.node.cmp(&b.node)));
        Ok(out)
    }

    /// Returns the node within `err` of `p`, or appends `p` as a new node.
    ///
    /// Uses the node grid when it is already present and a linear scan
    /// otherwise; never builds tables from a mesh that is still growing.
    pub fn add_find_point(&mut self, p: Point, err: f64) -> Result<NodeId, MeshError> {
        let nearest = if self.is_synchronized(TableMask::NODE_LOCATE) {
            self.nearest_node("add_find_point", p, f64::MAX)?
                .map(|c| (c.node, c.distance * c.distance))
        } else {
            let mut dmin = f64::MAX;
            let mut found = None;
            scan_nodes(self.geometry().points(), 0, p, &mut dmin, &mut found);
            found.map(|n| (n, dmin))
        };
        match nearest {
            Some((node, d2)) if d2 < err * err => Ok(node),
            _ => Ok(self.add_point(p)),
        }
    }

    /// Adds an element given by its corner positions, merging corners with
    /// existing nodes closer than `err`.
    pub fn add_element_from_points(
        &mut self,
        points: &[Point],
        err: f64,
    ) -> Result<ElementId, MeshError> {
        if points.len() != S::ARITY {
            return Err(MeshError::ArityMismatch {
                expected: S::ARITY,
                found: points.len(),
            });
        }
        let mut nodes = Vec::with_capacity(points.len());
        for &p in points {
            nodes.push(self.add_find_point(p, err)?);
        }
        self.add_element(&nodes)
    }

    // --- elements -----------------------------------------------------------

    fn coords_if_inside(&self, element: ElementId, p: Point, epsilon: f64) -> Option<LocalCoords> {
        if !self.element_bbox(element).padded(epsilon).contains(p) {
            return None;
        }
        let ctx = ElementContext::new(self.geometry(), element, epsilon)?;
        self.basis().get_coords(p, &ctx)
    }

    /// Local coordinates of `p` when it lies in `element`.
    pub fn inside(&self, element: ElementId, p: Point) -> Result<Option<LocalCoords>, MeshError> {
        self.element_nodes(element)?;
        let epsilon = self.epsilon()?;
        Ok(self.coords_if_inside(element, p, epsilon))
    }

    /// An element containing `p`, with the local coordinates of `p` in it.
    ///
    /// Linear geometry is located through the element grid; for higher
    /// polynomial orders the whole search is handed to [`Basis::locate`].
    pub fn locate_element_coords(
        &self,
        p: Point,
    ) -> Result<Option<(ElementId, LocalCoords)>, MeshError> {
        if self.basis().polynomial_order() > 1 {
            self.synchronize(TableMask::EDGES | TableMask::BOUNDING_BOX)?;
            let epsilon = self.bounding_volume("locate_element")?.epsilon;
            let edges = self.edge_table("locate_element")?;
            let geom = self.geometry();
            let candidates = geom.element_ids().filter_map(|e| {
                ElementContext::new(geom, e, epsilon).map(|ctx| ctx.with_edges(edges.of_element(e)))
            });
            return Ok(self.basis().locate(p, candidates));
        }

        self.synchronize(TableMask::ELEM_LOCATE)?;
        let epsilon = self.bounding_volume("locate_element")?.epsilon;
        let grid = self.elem_grid("locate_element")?;
        Ok(grid
            .lookup(p)
            .iter()
            .find_map(|&e| self.coords_if_inside(e, p, epsilon).map(|c| (e, c))))
    }

    /// An element containing `p`.
    pub fn locate_element(&self, p: Point) -> Result<Option<ElementId>, MeshError> {
        Ok(self.locate_element_coords(p)?.map(|(e, _)| e))
    }

    /// Elements registered in any grid cell overlapping `bbox`, ascending.
    ///
    /// This is a broad phase: the result may include elements whose own box
    /// misses `bbox`.
    pub fn locate_elements(&self, bbox: &BBox) -> Result<Vec<ElementId>, MeshError> {
        if !bbox.is_valid() {
            return Ok(Vec::new());
        }
        self.synchronize(TableMask::ELEM_LOCATE)?;
        let grid = self.elem_grid("locate_elements")?;
        let mut out: Vec<ElementId> = grid
            .cells_overlapping(bbox)
            .flat_map(|ijk| grid.lookup_ijk(ijk).iter().copied())
            .collect();
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    /// Closest point to `p` on the boundary faces of `element`, with its
    /// squared distance. `None` when the element has no boundary face.
    fn closest_on_boundary(&self, faces: &FaceTable, element: ElementId, p: Point) -> Option<(Point, f64)> {
        let mask = faces.boundary_mask(element).unwrap_or(0);
        if mask == 0 {
            return None;
        }
        let nodes = self.element_nodes(element).ok()?;
        let points = self.geometry().points();
        let at = |k: usize| points[nodes[k].index()];

        let mut best: Option<(Point, f64)> = None;
        for (k, face) in S::FACES.iter().enumerate() {
            if mask & (1 << k) == 0 {
                continue;
            }
            let r = match **face {
                [a, b, c] => closest_point_on_triangle(p, at(a), at(b), at(c)),
                [a, b, c, d] => est_closest_point_on_quad(p, at(a), at(b), at(c), at(d)),
                _ => continue,
            };
            let d = distance2(p, r);
            if best.is_none_or(|(_, dmin)| d < dmin) {
                best = Some((r, d));
            }
        }
        best
    }

    /// Turns a boundary point `r` of `element` into a result.
    ///
    /// Local coordinates come from the basis projection. Hits within epsilon
    /// are snapped onto the element through the basis; everything else keeps
    /// the closed-form point, so a projection that fails on a collapsed
    /// corner never loses the hit.
    fn refine(
        &self,
        element: ElementId,
        p: Point,
        r: Point,
        bv: &BoundingVolume,
    ) -> Result<ClosestElement, MeshError> {
        let ctx = ElementContext::new(self.geometry(), element, bv.epsilon).ok_or(
            MeshError::ElementOutOfRange {
                element,
                len: self.element_count(),
            },
        )?;
        let coords = self.basis().project(r, &ctx);
        let point = match coords {
            Some(x) if distance2(r, p) < bv.epsilon2() => self.basis().interpolate(x, &ctx),
            _ => r,
        };
        Ok(ClosestElement {
            element,
            point,
            coords,
            distance: distance2(point, p).sqrt(),
        })
    }

    /// Elements of the bucket of `p` that contain it, as zero-distance hits.
    fn containing(&self, p: Point, epsilon: f64, all: bool) -> Result<Vec<ClosestElement>, MeshError> {
        let grid = self.elem_grid("find_closest_element")?;
        let mut hits = Vec::new();
        for &element in grid.lookup(p) {
            if let Some(coords) = self.coords_if_inside(element, p, epsilon) {
                hits.push(ClosestElement {
                    element,
                    point: p,
                    coords: Some(coords),
                    distance: 0.0,
                });
                if !all {
                    break;
                }
            }
        }
        Ok(hits)
    }

    /// The element closest to `p`, strictly within `max_distance` (negative
    /// for no limit).
    ///
    /// An element containing `p` wins at distance zero. Otherwise the
    /// boundary faces of nearby elements are probed and the best point is
    /// refined through the basis.
    pub fn find_closest_element(
        &self,
        p: Point,
        max_distance: f64,
    ) -> Result<Option<ClosestElement>, MeshError> {
        self.synchronize(TableMask::FIND_CLOSEST_ELEM)?;
        if self.element_count() == 0 {
            return Ok(None);
        }
        let bv = *self.bounding_volume("find_closest_element")?;
        if let Some(hit) = self.containing(p, bv.epsilon, false)?.pop() {
            return Ok(Some(hit));
        }

        let grid = self.elem_grid("find_closest_element")?;
        let faces = self.face_table("find_closest_element")?;
        let eps2 = bv.epsilon2();
        let mut best = None;
        grid.shell_search(p, radius2(max_distance), |cell, mut dmin| {
            for &element in cell {
                if let Some((r, d)) = self.closest_on_boundary(faces, element, p) {
                    if d < dmin {
                        dmin = d;
                        best = Some((element, r));
                        if dmin < eps2 {
                            return ControlFlow::Break(dmin);
                        }
                    }
                }
            }
            ControlFlow::Continue(dmin)
        });

        best.map(|(element, r)| self.refine(element, p, r, &bv))
            .transpose()
    }

    /// Every element at the minimum distance from `p` (within epsilon),
    /// ascending by id. All containing elements when `p` is inside the mesh.
    pub fn find_closest_elements(&self, p: Point) -> Result<Vec<ClosestElement>, MeshError> {
        self.synchronize(TableMask::FIND_CLOSEST_ELEM)?;
        if self.element_count() == 0 {
            return Ok(Vec::new());
        }
        let bv = *self.bounding_volume("find_closest_elements")?;
        let mut inside = self.containing(p, bv.epsilon, true)?;
        if !inside.is_empty() {
            inside.sort_by_key(|c| c.element);
            return Ok(inside);
        }

        let grid = self.elem_grid("find_closest_elements")?;
        let faces = self.face_table("find_closest_elements")?;
        let eps2 = bv.epsilon2();
        let mut dmin = f64::MAX;
        let mut tied: Vec<(ElementId, Point)> = Vec::new();
        grid.shell_search(p, f64::MAX, |cell, _| {
            for &element in cell {
                if tied.iter().any(|&(e, _)| e == element) {
                    continue;
                }
                if let Some((r, d)) = self.closest_on_boundary(faces, element, p) {
                    if d < dmin - eps2 {
                        dmin = d;
                        tied.clear();
                        tied.push((element, r));
                    } else if d <= dmin + eps2 {
                        tied.push((element, r));
                    }
                }
            }
            // keep cells that could hold a tie
            ControlFlow::Continue(if dmin == f64::MAX { dmin } else { dmin + eps2 })
        });

        let mut out = tied
            .into_iter()
            .map(|(element, r)| self.refine(element, p, r, &bv))
            .collect::<Result<Vec<_>, _>>()?;
        out.sort_by_key(|c| c.element);
        Ok(out)
    }

    // --- edges and faces ----------------------------------------------------

    /// The edge nearest to `p`, measured to the edge segment. Ties go to the
    /// lowest id; `None` for a mesh without edges.
    pub fn locate_edge(&self, p: Point) -> Result<Option<EdgeId>, MeshError> {
        self.synchronize(TableMask::EDGES)?;
        let edges = self.edge_table("locate_edge")?;
        let points = self.geometry().points();
        Ok(edges
            .iter()
            .map(|(id, edge)| {
                let [a, b] = edge.nodes;
                let r = closest_point_on_segment(p, points[a.index()], points[b.index()]);
                (id, distance2(r, p))
            })
            .min_by(|x, y| x.1.total_cmp(&y.1))
            .map(|(id, _)| id))
    }

    /// The face nearest to `p`, measured to the face surface. Ties go to the
    /// lowest id; `None` for a mesh without faces.
    pub fn locate_face(&self, p: Point) -> Result<Option<FaceId>, MeshError> {
        self.synchronize(TableMask::FACES)?;
        let faces = self.face_table("locate_face")?;
        let points = self.geometry().points();
        let at = |n: &NodeId| points[n.index()];
        Ok(faces
            .iter()
            .filter_map(|(id, face)| {
                let r = match face.node_loop() {
                    [a, b, c] => closest_point_on_triangle(p, at(a), at(b), at(c)),
                    [a, b, c, d] => est_closest_point_on_quad(p, at(a), at(b), at(c), at(d)),
                    _ => return None,
                };
                Some((id, distance2(r, p)))
            })
            .min_by(|x, y| x.1.total_cmp(&y.1))
            .map(|(id, _)| id))
    }
}
