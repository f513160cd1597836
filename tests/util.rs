#![allow(dead_code)]
use mesh_locate::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Node id of lattice point `(i, j, k)` in an `(n+1)^3` lattice.
pub fn lattice_id(n: usize, i: usize, j: usize, k: usize) -> NodeId {
    NodeId::new((i + (n + 1) * (j + (n + 1) * k)) as u32)
}

fn add_lattice<S: ElementShape, B: Basis<S>>(mesh: &mut Mesh<S, B>, n: usize, layers: usize) {
    mesh.reserve_nodes((n + 1) * (n + 1) * (layers + 1));
    for k in 0..=layers {
        for j in 0..=n {
            for i in 0..=n {
                mesh.add_point([i as f64, j as f64, k as f64]);
            }
        }
    }
}

/// `n x n x n` block of unit hexes covering `[0, n]^3`.
pub fn hex_block(n: usize) -> HexVolMesh {
    let mut mesh = HexVolMesh::new();
    add_lattice(&mut mesh, n, n);
    mesh.reserve_elements(n * n * n);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                let id = |di, dj, dk| lattice_id(n, i + di, j + dj, k + dk);
                mesh.add_element(&[
                    id(0, 0, 0),
                    id(1, 0, 0),
                    id(1, 1, 0),
                    id(0, 1, 0),
                    id(0, 0, 1),
                    id(1, 0, 1),
                    id(1, 1, 1),
                    id(0, 1, 1),
                ])
                .unwrap();
            }
        }
    }
    mesh
}

/// `n x n x n` block where every cube is split into two prisms along the
/// `(i, j) - (i+1, j+1)` diagonal.
pub fn prism_block(n: usize) -> PrismVolMesh {
    let mut mesh = PrismVolMesh::new();
    add_lattice(&mut mesh, n, n);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                let id = |di, dj, dk| lattice_id(n, i + di, j + dj, k + dk);
                for tri in [[(0, 0), (1, 0), (1, 1)], [(0, 0), (1, 1), (0, 1)]] {
                    let bottom = tri.map(|(a, b)| id(a, b, 0));
                    let top = tri.map(|(a, b)| id(a, b, 1));
                    mesh.add_element(&[bottom[0], bottom[1], bottom[2], top[0], top[1], top[2]])
                        .unwrap();
                }
            }
        }
    }
    mesh
}

/// `n x n` grid of unit quads in the `z = 0` plane.
pub fn quad_sheet(n: usize) -> QuadSurfMesh {
    let mut mesh = QuadSurfMesh::new();
    add_lattice(&mut mesh, n, 0);
    for j in 0..n {
        for i in 0..n {
            let id = |di, dj| lattice_id(n, i + di, j + dj, 0);
            mesh.add_element(&[id(0, 0), id(1, 0), id(1, 1), id(0, 1)])
                .unwrap();
        }
    }
    mesh
}

/// Deterministic random points in `[lo, hi)^3`.
pub fn random_points(seed: u64, count: usize, lo: f64, hi: f64) -> Vec<Point> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            [
                rng.gen_range(lo..hi),
                rng.gen_range(lo..hi),
                rng.gen_range(lo..hi),
            ]
        })
        .collect()
}

pub fn dist2(a: Point, b: Point) -> f64 {
    (0..3).map(|i| (a[i] - b[i]) * (a[i] - b[i])).sum()
}

/// Brute-force nearest distance.
pub fn brute_nearest(points: &[Point], p: Point) -> Option<f64> {
    points
        .iter()
        .map(|&q| dist2(p, q))
        .min_by(f64::total_cmp)
        .map(f64::sqrt)
}

/// Distance from `p` to the axis-aligned box `[lo, hi]^3` (zero inside).
pub fn box_distance(p: Point, lo: f64, hi: f64) -> f64 {
    p.iter()
        .map(|&x| {
            let d = (lo - x).max(x - hi).max(0.0);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

pub fn approx(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}
