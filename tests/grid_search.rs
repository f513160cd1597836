mod util;

use mesh_locate::geometry::search_grid::{SearchGrid, grid_dims};
use mesh_locate::prelude::*;
use proptest::prelude::*;
use util::*;

fn cloud(points: &[Point]) -> HexVolMesh {
    let mut mesh = HexVolMesh::new();
    for &p in points {
        mesh.add_point(p);
    }
    mesh
}

/// Coordinates on a quarter-unit lattice, so many points sit exactly on
/// search-grid cell boundaries.
fn lattice_point() -> impl Strategy<Value = Point> {
    proptest::array::uniform3(0i32..=8).prop_map(|c| c.map(|v| v as f64 * 0.25))
}

fn free_point() -> impl Strategy<Value = Point> {
    proptest::array::uniform3(-1.0f64..3.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn closest_node_matches_brute_force(
        points in prop::collection::vec(lattice_point(), 1..60),
        queries in prop::collection::vec(prop_oneof![lattice_point(), free_point()], 1..20),
    ) {
        let mesh = cloud(&points);
        for p in queries {
            let want = brute_nearest(&points, p).unwrap();
            let got = mesh.find_closest_node(p, -1.0).unwrap().unwrap();
            prop_assert!(approx(got.distance, want, 1e-12), "p={:?} got={} want={}", p, got.distance, want);
            prop_assert!(approx(dist2(got.point, p).sqrt(), want, 1e-12));
        }
    }

    #[test]
    fn radius_query_matches_brute_force(
        points in prop::collection::vec(free_point(), 1..80),
        p in free_point(),
        radius in 0.05f64..1.5,
    ) {
        let mesh = cloud(&points);
        let got: Vec<u32> = {
            let mut v: Vec<u32> = mesh
                .find_closest_nodes(p, radius)
                .unwrap()
                .iter()
                .map(|c| c.node.get())
                .collect();
            v.sort_unstable();
            v
        };
        let want: Vec<u32> = points
            .iter()
            .enumerate()
            .filter(|(_, q)| dist2(**q, p) < radius * radius)
            .map(|(i, _)| i as u32)
            .collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn added_point_is_its_own_nearest(
        points in prop::collection::vec(free_point(), 1..40),
        extra in free_point(),
    ) {
        let mut mesh = cloud(&points);
        mesh.synchronize(TableMask::NODE_LOCATE).unwrap();
        let id = mesh.add_point(extra);
        let found = mesh.locate_node(extra).unwrap().unwrap();
        // a duplicate coordinate may win the tie
        prop_assert_eq!(mesh.point(found).unwrap(), extra);
        prop_assert!(found == id || points.contains(&extra));
    }

    #[test]
    fn grid_resolution_is_at_least_one(
        a in free_point(),
        b in free_point(),
        count in 0usize..5000,
    ) {
        let dims = grid_dims(&BBox::new(a, b), count);
        prop_assert!(dims.iter().all(|&d| d >= 1));
    }
}

#[test]
fn flat_and_point_clouds_still_search() {
    // all points in one plane: one cell thick along z
    let flat: Vec<Point> = (0..25)
        .map(|i| [(i % 5) as f64, (i / 5) as f64, 0.0])
        .collect();
    let mesh = cloud(&flat);
    let c = mesh.find_closest_node([2.2, 3.1, 4.0], -1.0).unwrap().unwrap();
    assert_eq!(c.point, [2.0, 3.0, 0.0]);

    let single = cloud(&[[1.0, 2.0, 3.0]]);
    let c = single.find_closest_node([9.0, 9.0, 9.0], -1.0).unwrap().unwrap();
    assert_eq!(c.node, NodeId::new(0));
}

#[test]
fn box_insertion_covers_every_overlapped_cell() {
    let mut grid = SearchGrid::<u32>::new(BBox::new([0.0; 3], [4.0; 3]), [4, 4, 4]);
    grid.insert_box(7, &BBox::new([0.5, 0.5, 0.5], [2.5, 1.5, 0.7]));
    let hit: usize = (0..4)
        .flat_map(|i| (0..4).flat_map(move |j| (0..4).map(move |k| [i, j, k])))
        .filter(|&ijk| grid.lookup_ijk(ijk).contains(&7))
        .count();
    assert_eq!(hit, 3 * 2);
}
