//! Per-element measures: Jacobian quality, random sampling and surface
//! normals.

use rand::Rng;

use super::Mesh;
use crate::basis::{Basis, Jacobian, LocalCoords};
use crate::geometry::quality::{det3, sample_simplex, scaled_det3, simplex_measure};
use crate::geometry::vector::{Point, add, cross, norm, scale, sub};
use crate::mesh_error::MeshError;
use crate::sync::TableMask;
use crate::topology::cell_type::{ElementShape, QuadShape};
use crate::topology::point::{ElementId, NodeId};

impl<S: ElementShape, B: Basis<S>> Mesh<S, B> {
    /// Jacobian determinant of `element` at `coords`. For surface elements
    /// this is the area scale `|J0 × J1|`.
    pub fn det_jacobian(&self, element: ElementId, coords: LocalCoords) -> Result<f64, MeshError> {
        Ok(det3(&self.jacobian_at(element, coords)?))
    }

    /// Smallest Jacobian determinant over the element center and corners.
    pub fn jacobian_metric(&self, element: ElementId) -> Result<f64, MeshError> {
        self.min_over_reference_points(element, det3)
    }

    /// Smallest scaled Jacobian over the element center and corners: 1 for a
    /// box, lower as corners shear, negative once the element inverts.
    pub fn scaled_jacobian_metric(&self, element: ElementId) -> Result<f64, MeshError> {
        self.min_over_reference_points(element, scaled_det3)
    }

    fn min_over_reference_points(
        &self,
        element: ElementId,
        metric: impl Fn(&Jacobian) -> f64,
    ) -> Result<f64, MeshError> {
        let ctx = self.element_context(element)?;
        Ok(std::iter::once(S::REFERENCE_CENTER)
            .chain(S::REFERENCE_VERTICES.iter().copied())
            .map(|x| metric(&self.basis().derivate(x, &ctx)))
            .fold(f64::INFINITY, f64::min))
    }

    /// A point drawn uniformly from `element`.
    ///
    /// The element is split into simplices; one is picked with probability
    /// proportional to its measure and sampled uniformly. A fully collapsed
    /// element falls back to its first simplex.
    pub fn random_point<R: Rng + ?Sized>(
        &self,
        element: ElementId,
        rng: &mut R,
    ) -> Result<Point, MeshError> {
        let points = self.geometry().element_points(element)?;
        let corners: Vec<Vec<Point>> = S::SIMPLICES
            .iter()
            .map(|s| s.iter().map(|&k| points[k]).collect())
            .collect();
        let weights: Vec<f64> = corners.iter().map(|c| simplex_measure(c)).collect();
        let total: f64 = weights.iter().sum();

        let mut pick = 0;
        if total > 0.0 {
            let target = rng.gen_range(0.0..total);
            let mut acc = 0.0;
            pick = weights.len() - 1;
            for (k, w) in weights.iter().enumerate() {
                acc += w;
                if acc > target {
                    pick = k;
                    break;
                }
            }
        }
        let u = [rng.r#gen(), rng.r#gen(), rng.r#gen()];
        Ok(sample_simplex(&corners[pick], u))
    }
}

impl<B: Basis<QuadShape>> Mesh<QuadShape, B> {
    /// Unit normal of a surface element at `coords`, `J0 × J1` normalized.
    pub fn element_normal(&self, element: ElementId, coords: LocalCoords) -> Result<Point, MeshError> {
        let jac = self.jacobian_at(element, coords)?;
        let n = cross(jac[0], jac[1]);
        let len = norm(n);
        if len <= 0.0 {
            return Err(MeshError::InvalidGeometry(format!(
                "element {element:?} has no normal at {coords:?}"
            )));
        }
        Ok(scale(n, 1.0 / len))
    }

    /// Unit normal at a node: the area-weighted average of the normals of
    /// the elements around it. Synchronizes `NODE_NEIGHBORS`.
    pub fn node_normal(&self, node: NodeId) -> Result<Point, MeshError> {
        self.synchronize(TableMask::NODE_NEIGHBORS)?;
        let mut sum = [0.0; 3];
        for element in self.elements_of_node(node)? {
            let p = self.geometry().element_points(element)?;
            // half the diagonal cross product is the vector area
            sum = add(sum, cross(sub(p[2], p[0]), sub(p[3], p[1])));
        }
        let len = norm(sum);
        if len <= 0.0 {
            return Err(MeshError::InvalidGeometry(format!(
                "node {node:?} has no normal"
            )));
        }
        Ok(scale(sum, 1.0 / len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{HexVolMesh, PrismVolMesh, QuadSurfMesh};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn hex(corners: [Point; 8]) -> HexVolMesh {
        let mut mesh = HexVolMesh::new();
        let ids: Vec<NodeId> = corners.iter().map(|&p| mesh.add_point(p)).collect();
        mesh.add_element(&ids).unwrap();
        mesh
    }

    const CUBE: [Point; 8] = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];

    #[test]
    fn jacobian_metrics_of_a_box_and_a_sheared_hex() {
        let e = ElementId::new(0);
        let mut stretched = CUBE;
        for p in &mut stretched {
            p[0] *= 2.0;
        }
        let mesh = hex(stretched);
        assert!(approx(mesh.det_jacobian(e, [0.5; 3]).unwrap(), 2.0));
        assert!(approx(mesh.jacobian_metric(e).unwrap(), 2.0));
        assert!(approx(mesh.scaled_jacobian_metric(e).unwrap(), 1.0));

        let mut sheared = CUBE;
        for p in &mut sheared[4..] {
            p[0] += 1.0;
        }
        let mesh = hex(sheared);
        assert!(approx(mesh.jacobian_metric(e).unwrap(), 1.0));
        assert!(approx(mesh.scaled_jacobian_metric(e).unwrap(), 0.5f64.sqrt()));
    }

    #[test]
    fn inverted_hex_has_negative_metric() {
        let mut corners = CUBE;
        corners.swap(4, 0);
        let mesh = hex(corners);
        assert!(mesh.jacobian_metric(ElementId::new(0)).unwrap() < 0.0);
        assert!(mesh.scaled_jacobian_metric(ElementId::new(0)).unwrap() < 0.0);
    }

    #[test]
    fn random_points_fall_inside() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut corners = CUBE;
        for p in &mut corners {
            p[0] += 0.5 * p[2];
            p[1] *= 1.5;
        }
        let mesh = hex(corners);
        let e = ElementId::new(0);
        for _ in 0..200 {
            let p = mesh.random_point(e, &mut rng).unwrap();
            assert!(mesh.inside(e, p).unwrap().is_some(), "{p:?} escaped");
        }

        let mut prisms = PrismVolMesh::new();
        prisms
            .add_element_from_points(
                &[
                    [0.0, 0.0, 0.0],
                    [1.0, 0.0, 0.0],
                    [0.0, 1.0, 0.0],
                    [0.0, 0.0, 1.0],
                    [1.0, 0.0, 1.0],
                    [0.0, 1.0, 1.0],
                ],
                1e-9,
            )
            .unwrap();
        for _ in 0..200 {
            let p = prisms.random_point(e, &mut rng).unwrap();
            assert!(prisms.inside(e, p).unwrap().is_some(), "{p:?} escaped");
        }

        assert!(matches!(
            mesh.random_point(ElementId::new(9), &mut rng),
            Err(MeshError::ElementOutOfRange { .. })
        ));
    }

    #[test]
    fn random_point_of_a_flat_element_is_its_first_corner_simplex() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut mesh = QuadSurfMesh::new();
        let n = mesh.add_point([1.0, 2.0, 3.0]);
        mesh.add_element(&[n, n, n, n]).unwrap();
        let p = mesh.random_point(ElementId::new(0), &mut rng).unwrap();
        assert_eq!(p, [1.0, 2.0, 3.0]);
    }

    fn quad_strip() -> QuadSurfMesh {
        let mut mesh = QuadSurfMesh::new();
        let n: Vec<NodeId> = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 1.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [2.0, 1.0, 1.0],
        ]
        .into_iter()
        .map(|p| mesh.add_point(p))
        .collect();
        mesh.add_element(&[n[0], n[1], n[4], n[3]]).unwrap();
        mesh.add_element(&[n[1], n[2], n[5], n[4]]).unwrap();
        mesh
    }

    #[test]
    fn surface_normals() {
        let mesh = quad_strip();
        let n = mesh.element_normal(ElementId::new(0), [0.3, 0.7, 0.0]).unwrap();
        assert!(approx(n[2], 1.0));

        let tilted = mesh.element_normal(ElementId::new(1), [0.5, 0.5, 0.0]).unwrap();
        let h = 0.5f64.sqrt();
        assert!(approx(tilted[0], -h) && approx(tilted[2], h));

        // shared nodes average the two faces
        let shared = mesh.node_normal(NodeId::new(1)).unwrap();
        assert!(approx(norm(shared), 1.0));
        assert!(shared[0] < 0.0 && shared[2] > h);
        let corner = mesh.node_normal(NodeId::new(0)).unwrap();
        assert!(approx(corner[2], 1.0));
    }

    #[test]
    fn collapsed_quad_has_no_normal() {
        let mut mesh = QuadSurfMesh::new();
        let a = mesh.add_point([0.0, 0.0, 0.0]);
        let b = mesh.add_point([1.0, 0.0, 0.0]);
        mesh.add_element(&[a, b, b, a]).unwrap();
        assert!(matches!(
            mesh.element_normal(ElementId::new(0), [0.5, 0.5, 0.0]),
            Err(MeshError::InvalidGeometry(_))
        ));
        assert!(matches!(
            mesh.node_normal(a),
            Err(MeshError::InvalidGeometry(_))
        ));
    }
}
