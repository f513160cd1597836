//! Jacobian quality kernels and uniform sampling of simplices.
//!
//! Elements are measured through their basis Jacobian (rows are the
//! derivatives along each reference direction) and sampled through a split
//! into tetrahedra or triangles.

use super::vector::{Point, add, cross, dot, norm, scale, sub};
use crate::basis::Jacobian;

const EPS: f64 = 1e-12;

/// Determinant of a Jacobian, `j0 · (j1 × j2)`.
#[inline]
pub fn det3(jac: &Jacobian) -> f64 {
    dot(jac[0], cross(jac[1], jac[2]))
}

/// Determinant divided by the product of the row lengths, in `[-1, 1]`.
/// Zero when any row vanishes.
pub fn scaled_det3(jac: &Jacobian) -> f64 {
    let lengths = norm(jac[0]) * norm(jac[1]) * norm(jac[2]);
    if lengths <= EPS {
        return 0.0;
    }
    det3(jac) / lengths
}

/// Area of a triangle or unsigned volume of a tetrahedron.
pub fn simplex_measure(v: &[Point]) -> f64 {
    match v {
        [a, b, c] => 0.5 * norm(cross(sub(*b, *a), sub(*c, *a))),
        [a, b, c, d] => dot(sub(*b, *a), cross(sub(*c, *a), sub(*d, *a))).abs() / 6.0,
        _ => 0.0,
    }
}

/// Maps three uniform samples in `[0, 1)` to a uniformly distributed point of
/// a triangle or tetrahedron.
///
/// The unit cube is folded onto the reference simplex so the distribution
/// stays uniform. Other vertex counts return the first vertex.
pub fn sample_simplex(v: &[Point], u: [f64; 3]) -> Point {
    match v {
        [a, b, c] => {
            let (mut s, mut t) = (u[0], u[1]);
            if s + t > 1.0 {
                s = 1.0 - s;
                t = 1.0 - t;
            }
            add(*a, add(scale(sub(*b, *a), s), scale(sub(*c, *a), t)))
        }
        [v0, v1, v2, v3] => {
            let [mut t, mut s, mut w] = u;
            if t + s > 1.0 {
                t = 1.0 - t;
                s = 1.0 - s;
            }
            if s + w > 1.0 {
                let tmp = w;
                w = 1.0 - t - s;
                s = 1.0 - tmp;
            } else if t + s + w > 1.0 {
                let tmp = w;
                w = t + s + w - 1.0;
                t = 1.0 - s - tmp;
            }
            let a = 1.0 - t - s - w;
            let mut out = scale(*v0, a);
            out = add(out, scale(*v1, t));
            out = add(out, scale(*v2, s));
            add(out, scale(*v3, w))
        }
        [first, ..] => *first,
        [] => [0.0; 3],
    }
}
