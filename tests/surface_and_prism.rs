mod util;

use mesh_locate::prelude::*;
use util::*;

#[test]
fn prism_block_locates_and_measures() {
    let n = 2;
    let mesh = prism_block(n);
    let count = mesh.element_count() as u32;
    assert_eq!(count, 2 * 8);

    let mut total = 0.0;
    for e in (0..count).map(ElementId::new) {
        total += mesh.element_volume(e).unwrap();
        let c = mesh.element_center(e).unwrap();
        assert_eq!(mesh.locate_element(c).unwrap(), Some(e));
    }
    assert!(approx(total, 8.0, 1e-9));
}

#[test]
fn prism_closest_element_from_outside() {
    let n = 2;
    let mesh = prism_block(n);
    for p in random_points(21, 100, -1.0, 3.0) {
        let c = mesh.find_closest_element(p, -1.0).unwrap().unwrap();
        assert!(approx(c.distance, box_distance(p, 0.0, 2.0), 1e-7), "{p:?}");
    }
}

#[test]
fn prism_faces_and_neighbors() {
    let mesh = prism_block(1);
    mesh.synchronize(TableMask::FACES | TableMask::EDGES).unwrap();
    // the diagonal quad is shared by both prisms
    let (a, b) = (ElementId::new(0), ElementId::new(1));
    assert_eq!(mesh.element_neighbors(a).unwrap(), vec![b]);
    assert_eq!(mesh.boundary_mask(a).unwrap().count_ones(), 4);
    let shared = mesh
        .face_from_nodes(&[
            lattice_id(1, 0, 0, 0),
            lattice_id(1, 1, 1, 0),
            lattice_id(1, 1, 1, 1),
            lattice_id(1, 0, 0, 1),
        ])
        .unwrap()
        .expect("diagonal face");
    assert_eq!(mesh.elements_of_face(shared).unwrap(), vec![a, b]);
    assert_eq!(mesh.edges_of_face(shared).unwrap().len(), 4);
}

#[test]
fn quad_sheet_closest_points_project_onto_the_surface() {
    let n = 3;
    let mesh = quad_sheet(n);
    for p in random_points(5, 100, -1.0, 4.0) {
        let c = mesh.find_closest_element(p, -1.0).unwrap().unwrap();
        let dx = (0.0 - p[0]).max(p[0] - 3.0).max(0.0);
        let dy = (0.0 - p[1]).max(p[1] - 3.0).max(0.0);
        let want = (dx * dx + dy * dy + p[2] * p[2]).sqrt();
        assert!(approx(c.distance, want, 1e-7), "{p:?}: {} vs {want}", c.distance);
        assert!(c.point[2].abs() < 1e-12);
    }
}

#[test]
fn quad_sheet_reports_ties_across_an_edge() {
    let mesh = quad_sheet(2);
    let ties = mesh.find_closest_elements([1.0, 0.5, 1.0]).unwrap();
    let ids: Vec<_> = ties.iter().map(|c| c.element).collect();
    assert_eq!(ids, vec![ElementId::new(0), ElementId::new(1)]);
    assert!(ties.iter().all(|c| approx(c.distance, 1.0, 1e-12)));

    let inside = mesh.find_closest_elements([0.5, 0.5, 0.0]).unwrap();
    assert_eq!(inside.len(), 1);
    assert_eq!(inside[0].distance, 0.0);
}

#[test]
fn quad_areas_and_normals() {
    let mesh = quad_sheet(2);
    let e = ElementId::new(3);
    assert!(approx(mesh.element_volume(e).unwrap(), 1.0, 1e-12));
    let j = mesh.jacobian_at(e, [0.5, 0.5, 0.0]).unwrap();
    assert!(approx(j[2][2].abs(), 1.0, 1e-12));
    assert_eq!(mesh.interpolate_in(e, [0.0, 0.0, 0.0]).unwrap(), [1.0, 1.0, 0.0]);
}
