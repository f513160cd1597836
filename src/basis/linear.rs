//! First-order Lagrange basis: trilinear hexahedra, linear prisms and
//! bilinear quadrilaterals.
//!
//! Reference domains:
//! - Quadrilateral: `(r, s)` in `[0, 1]^2`.
//! - Prism: `(r, s)` in the unit right triangle, `t` in `[0, 1]`.
//! - Hexahedron: `(r, s, t)` in `[0, 1]^3`.
//!
//! Inversion is a Newton iteration on the least-squares normal equations,
//! which also covers surface elements embedded in 3D.

use super::{Basis, ElementContext, Jacobian, LocalCoords};
use crate::geometry::vector::{Point, cross, dot, norm, scale, sub};
use crate::topology::cell_type::{ElementShape, HexShape, PrismShape, QuadShape};

/// Newton stops once a step is shorter than this (reference units).
const STEP_TOLERANCE: f64 = 1e-7;
/// Slack allowed outside the reference domain.
const INSIDE_TOLERANCE: f64 = 1e-7;
const MAX_STEPS: usize = 100;
const EPS: f64 = 1e-12;

/// Linear Lagrange basis for every supported family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearLagrange;

/// Shape functions of one family, evaluated into fixed 8-slot buffers.
pub trait LagrangeShape: ElementShape {
    /// Reference dimension.
    const DIM: usize;

    /// Weights and reference gradients at `x`; slots past `ARITY` are zero.
    fn shape(x: LocalCoords) -> ([f64; 8], [[f64; 3]; 8]);

    fn contains(x: LocalCoords, tol: f64) -> bool;

    /// Nearest point of the reference domain to `x`.
    fn clamp(x: LocalCoords) -> LocalCoords;

    /// Starting points tried before Newton iteration.
    fn samples() -> &'static [LocalCoords];

    /// Quadrature points and weights over the reference domain.
    fn quadrature() -> &'static [(LocalCoords, f64)];
}

const G0: f64 = 0.211_324_865_405_187_1; // (1 - 1/sqrt(3)) / 2
const G1: f64 = 0.788_675_134_594_812_9; // (1 + 1/sqrt(3)) / 2
const T1: f64 = 1.0 / 3.0;
const T2: f64 = 2.0 / 3.0;

impl LagrangeShape for QuadShape {
    const DIM: usize = 2;

    fn shape(x: LocalCoords) -> ([f64; 8], [[f64; 3]; 8]) {
        let [r, s, _] = x;
        let mut w = [0.0; 8];
        let mut g = [[0.0; 3]; 8];
        w[..4].copy_from_slice(&[(1.0 - r) * (1.0 - s), r * (1.0 - s), r * s, (1.0 - r) * s]);
        g[..4].copy_from_slice(&[
            [-(1.0 - s), -(1.0 - r), 0.0],
            [1.0 - s, -r, 0.0],
            [s, r, 0.0],
            [-s, 1.0 - r, 0.0],
        ]);
        (w, g)
    }

    fn contains(x: LocalCoords, tol: f64) -> bool {
        (0..2).all(|a| x[a] >= -tol && x[a] <= 1.0 + tol)
    }

    fn clamp(x: LocalCoords) -> LocalCoords {
        [x[0].clamp(0.0, 1.0), x[1].clamp(0.0, 1.0), 0.0]
    }

    fn samples() -> &'static [LocalCoords] {
        const SAMPLES: &[LocalCoords] = &[
            [T1, T1, 0.0],
            [T2, T1, 0.0],
            [T1, T2, 0.0],
            [T2, T2, 0.0],
        ];
        SAMPLES
    }

    fn quadrature() -> &'static [(LocalCoords, f64)] {
        const POINTS: &[(LocalCoords, f64)] = &[
            ([G0, G0, 0.0], 0.25),
            ([G1, G0, 0.0], 0.25),
            ([G0, G1, 0.0], 0.25),
            ([G1, G1, 0.0], 0.25),
        ];
        POINTS
    }
}

impl LagrangeShape for PrismShape {
    const DIM: usize = 3;

    fn shape(x: LocalCoords) -> ([f64; 8], [[f64; 3]; 8]) {
        let [r, s, t] = x;
        let rm = 1.0 - r - s;
        let tm = 1.0 - t;
        let mut w = [0.0; 8];
        let mut g = [[0.0; 3]; 8];
        w[..6].copy_from_slice(&[rm * tm, r * tm, s * tm, rm * t, r * t, s * t]);
        g[..6].copy_from_slice(&[
            [-tm, -tm, -rm],
            [tm, 0.0, -r],
            [0.0, tm, -s],
            [-t, -t, rm],
            [t, 0.0, r],
            [0.0, t, s],
        ]);
        (w, g)
    }

    fn contains(x: LocalCoords, tol: f64) -> bool {
        x[0] >= -tol
            && x[1] >= -tol
            && x[0] + x[1] <= 1.0 + tol
            && x[2] >= -tol
            && x[2] <= 1.0 + tol
    }

    fn clamp(x: LocalCoords) -> LocalCoords {
        let (mut r, mut s) = (x[0].max(0.0), x[1].max(0.0));
        if r + s > 1.0 {
            // project onto the hypotenuse r + s = 1
            r = ((r - s + 1.0) * 0.5).clamp(0.0, 1.0);
            s = 1.0 - r;
        }
        [r, s, x[2].clamp(0.0, 1.0)]
    }

    fn samples() -> &'static [LocalCoords] {
        const SAMPLES: &[LocalCoords] = &[
            [0.25, 0.25, T1],
            [0.5, 0.25, T1],
            [0.25, 0.5, T1],
            [0.25, 0.25, T2],
            [0.5, 0.25, T2],
            [0.25, 0.5, T2],
        ];
        SAMPLES
    }

    fn quadrature() -> &'static [(LocalCoords, f64)] {
        // 3-point triangle rule (weights sum to 1/2) times 2-point Gauss in t
        const W: f64 = 1.0 / 12.0;
        const POINTS: &[(LocalCoords, f64)] = &[
            ([1.0 / 6.0, 1.0 / 6.0, G0], W),
            ([2.0 / 3.0, 1.0 / 6.0, G0], W),
            ([1.0 / 6.0, 2.0 / 3.0, G0], W),
            ([1.0 / 6.0, 1.0 / 6.0, G1], W),
            ([2.0 / 3.0, 1.0 / 6.0, G1], W),
            ([1.0 / 6.0, 2.0 / 3.0, G1], W),
        ];
        POINTS
    }
}

impl LagrangeShape for HexShape {
    const DIM: usize = 3;

    fn shape(x: LocalCoords) -> ([f64; 8], [[f64; 3]; 8]) {
        let [r, s, t] = x;
        let rm = 1.0 - r;
        let sm = 1.0 - s;
        let tm = 1.0 - t;
        let w = [
            rm * sm * tm,
            r * sm * tm,
            r * s * tm,
            rm * s * tm,
            rm * sm * t,
            r * sm * t,
            r * s * t,
            rm * s * t,
        ];
        let g = [
            [-sm * tm, -rm * tm, -rm * sm],
            [sm * tm, -r * tm, -r * sm],
            [s * tm, r * tm, -r * s],
            [-s * tm, rm * tm, -rm * s],
            [-sm * t, -rm * t, rm * sm],
            [sm * t, -r * t, r * sm],
            [s * t, r * t, r * s],
            [-s * t, rm * t, rm * s],
        ];
        (w, g)
    }

    fn contains(x: LocalCoords, tol: f64) -> bool {
        (0..3).all(|a| x[a] >= -tol && x[a] <= 1.0 + tol)
    }

    fn clamp(x: LocalCoords) -> LocalCoords {
        x.map(|v| v.clamp(0.0, 1.0))
    }

    fn samples() -> &'static [LocalCoords] {
        const SAMPLES: &[LocalCoords] = &[
            [T1, T1, T1],
            [T2, T1, T1],
            [T1, T2, T1],
            [T2, T2, T1],
            [T1, T1, T2],
            [T2, T1, T2],
            [T1, T2, T2],
            [T2, T2, T2],
        ];
        SAMPLES
    }

    fn quadrature() -> &'static [(LocalCoords, f64)] {
        const POINTS: &[(LocalCoords, f64)] = &[
            ([G0, G0, G0], 0.125),
            ([G1, G0, G0], 0.125),
            ([G0, G1, G0], 0.125),
            ([G1, G1, G0], 0.125),
            ([G0, G0, G1], 0.125),
            ([G1, G0, G1], 0.125),
            ([G0, G1, G1], 0.125),
            ([G1, G1, G1], 0.125),
        ];
        POINTS
    }
}

fn map<S: LagrangeShape>(x: LocalCoords, ctx: &ElementContext<'_, S>) -> Point {
    let (w, _) = S::shape(x);
    let mut out = [0.0; 3];
    for (k, p) in ctx.points().enumerate() {
        for a in 0..3 {
            out[a] += w[k] * p[a];
        }
    }
    out
}

fn jacobian<S: LagrangeShape>(x: LocalCoords, ctx: &ElementContext<'_, S>) -> Jacobian {
    let (_, g) = S::shape(x);
    let mut jac = [[0.0; 3]; 3];
    for (k, p) in ctx.points().enumerate() {
        for r in 0..S::DIM {
            for a in 0..3 {
                jac[r][a] += p[a] * g[k][r];
            }
        }
    }
    if S::DIM == 2 {
        let n = cross(jac[0], jac[1]);
        let len = norm(n);
        if len > EPS {
            jac[2] = scale(n, 1.0 / len);
        }
    }
    jac
}

/// Least-squares solve of `J dx = rhs` through the normal equations.
fn pull_back(jac: &Jacobian, dim: usize, rhs: Point) -> Option<LocalCoords> {
    match dim {
        2 => {
            let a = dot(jac[0], jac[0]);
            let b = dot(jac[0], jac[1]);
            let c = dot(jac[1], jac[1]);
            let det = a * c - b * b;
            if det.abs() <= EPS {
                return None;
            }
            let r0 = dot(jac[0], rhs);
            let r1 = dot(jac[1], rhs);
            let inv = 1.0 / det;
            Some([(c * r0 - b * r1) * inv, (-b * r0 + a * r1) * inv, 0.0])
        }
        3 => {
            let mut m = [0.0; 9];
            for i in 0..3 {
                for j in 0..3 {
                    m[i * 3 + j] = dot(jac[i], jac[j]);
                }
            }
            let r = [dot(jac[0], rhs), dot(jac[1], rhs), dot(jac[2], rhs)];
            let inv = invert_3x3(m)?;
            Some([
                inv[0] * r[0] + inv[1] * r[1] + inv[2] * r[2],
                inv[3] * r[0] + inv[4] * r[1] + inv[5] * r[2],
                inv[6] * r[0] + inv[7] * r[1] + inv[8] * r[2],
            ])
        }
        _ => None,
    }
}

fn invert_3x3(m: [f64; 9]) -> Option<[f64; 9]> {
    let det = m[0] * (m[4] * m[8] - m[5] * m[7]) - m[1] * (m[3] * m[8] - m[5] * m[6])
        + m[2] * (m[3] * m[7] - m[4] * m[6]);
    if det.abs() <= EPS {
        return None;
    }
    let inv_det = 1.0 / det;
    Some([
        (m[4] * m[8] - m[5] * m[7]) * inv_det,
        (m[2] * m[7] - m[1] * m[8]) * inv_det,
        (m[1] * m[5] - m[2] * m[4]) * inv_det,
        (m[5] * m[6] - m[3] * m[8]) * inv_det,
        (m[0] * m[8] - m[2] * m[6]) * inv_det,
        (m[2] * m[3] - m[0] * m[5]) * inv_det,
        (m[3] * m[7] - m[4] * m[6]) * inv_det,
        (m[1] * m[6] - m[0] * m[7]) * inv_det,
        (m[0] * m[4] - m[1] * m[3]) * inv_det,
    ])
}

fn initial_guess<S: LagrangeShape>(p: Point, ctx: &ElementContext<'_, S>) -> LocalCoords {
    let mut best = S::samples()[0];
    let mut dmin = f64::MAX;
    for &x in S::samples() {
        let d = sub(map(x, ctx), p);
        let d = dot(d, d);
        if d < dmin {
            dmin = d;
            best = x;
        }
    }
    best
}

/// Newton iteration for the local coordinates of `p`, without the
/// reference-domain check.
///
/// `Err` carries the iterate with the smallest residual when the iteration
/// hits a singular Jacobian (collapsed corners) or runs out of steps.
fn solve<S: LagrangeShape>(p: Point, ctx: &ElementContext<'_, S>) -> Result<LocalCoords, LocalCoords> {
    let mut x = initial_guess(p, ctx);
    let mut best = (f64::MAX, x);
    for _ in 0..MAX_STEPS {
        let residual = sub(map(x, ctx), p);
        let r2 = dot(residual, residual);
        if r2 < best.0 {
            best = (r2, x);
        }
        let jac = jacobian(x, ctx);
        let Some(step) = pull_back(&jac, S::DIM, residual) else {
            return Err(best.1);
        };
        for a in 0..S::DIM {
            x[a] -= step[a];
        }
        if norm(step) < STEP_TOLERANCE {
            return Ok(x);
        }
    }
    Err(best.1)
}

impl<S: LagrangeShape> Basis<S> for LinearLagrange {
    fn get_coords(&self, p: Point, ctx: &ElementContext<'_, S>) -> Option<LocalCoords> {
        solve(p, ctx).ok().filter(|&x| S::contains(x, INSIDE_TOLERANCE))
    }

    fn project(&self, p: Point, ctx: &ElementContext<'_, S>) -> Option<LocalCoords> {
        let x = solve(p, ctx).unwrap_or_else(|best| best);
        Some(S::clamp(x))
    }

    fn interpolate(&self, coords: LocalCoords, ctx: &ElementContext<'_, S>) -> Point {
        map(coords, ctx)
    }

    fn derivate(&self, coords: LocalCoords, ctx: &ElementContext<'_, S>) -> Jacobian {
        jacobian(coords, ctx)
    }

    fn get_volume(&self, ctx: &ElementContext<'_, S>) -> f64 {
        S::quadrature()
            .iter()
            .map(|&(x, w)| {
                let j = jacobian(x, ctx);
                let measure = if S::DIM == 2 {
                    norm(cross(j[0], j[1]))
                } else {
                    dot(j[0], cross(j[1], j[2])).abs()
                };
                w * measure
            })
            .sum()
    }
}
