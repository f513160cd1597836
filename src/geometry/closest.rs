//! Closed-form closest-point kernels used by the closest-element search.

use super::vector::{Point, add, distance2, dot, scale, sub};

/// Closest point to `p` on the segment `[a, b]`.
pub fn closest_point_on_segment(p: Point, a: Point, b: Point) -> Point {
    let ab = sub(b, a);
    let len2 = dot(ab, ab);
    if len2 <= 0.0 {
        return a;
    }
    let t = (dot(sub(p, a), ab) / len2).clamp(0.0, 1.0);
    add(a, scale(ab, t))
}

/// Closest point to `p` on the triangle `(v0, v1, v2)`.
///
/// Region classification over vertex, edge and face Voronoi regions.
/// Degenerate (zero-area) triangles fall back to the closest of their edges.
pub fn closest_point_on_triangle(p: Point, v0: Point, v1: Point, v2: Point) -> Point {
    let ab = sub(v1, v0);
    let ac = sub(v2, v0);
    let ap = sub(p, v0);

    let d1 = dot(ab, ap);
    let d2 = dot(ac, ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return v0;
    }

    let bp = sub(p, v1);
    let d3 = dot(ab, bp);
    let d4 = dot(ac, bp);
    if d3 >= 0.0 && d4 <= d3 {
        return v1;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return add(v0, scale(ab, v));
    }

    let cp = sub(p, v2);
    let d5 = dot(ab, cp);
    let d6 = dot(ac, cp);
    if d6 >= 0.0 && d5 <= d6 {
        return v2;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return add(v0, scale(ac, w));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return add(v1, scale(sub(v2, v1), w));
    }

    let denom = va + vb + vc;
    if denom.abs() <= f64::MIN_POSITIVE {
        return nearest_of(
            p,
            [
                closest_point_on_segment(p, v0, v1),
                closest_point_on_segment(p, v1, v2),
                closest_point_on_segment(p, v2, v0),
            ],
        );
    }
    let inv = 1.0 / denom;
    let v = vb * inv;
    let w = vc * inv;
    add(v0, add(scale(ab, v), scale(ac, w)))
}

/// Estimated closest point to `p` on a (possibly non-planar) quad.
///
/// Both diagonal splits of the quad are evaluated; the result is the average
/// of the better candidate of each split. Exact for planar quads.
pub fn est_closest_point_on_quad(p: Point, p0: Point, p1: Point, p2: Point, p3: Point) -> Point {
    let r1 = closest_point_on_triangle(p, p0, p1, p3);
    let r2 = closest_point_on_triangle(p, p3, p1, p2);
    let r3 = closest_point_on_triangle(p, p0, p2, p3);
    let r4 = closest_point_on_triangle(p, p0, p1, p2);

    let a = if distance2(r2, p) < distance2(r1, p) { r2 } else { r1 };
    let b = if distance2(r4, p) < distance2(r3, p) { r4 } else { r3 };
    scale(add(a, b), 0.5)
}

fn nearest_of<const N: usize>(p: Point, candidates: [Point; N]) -> Point {
    let mut best = candidates[0];
    for c in candidates.iter().skip(1) {
        if distance2(*c, p) < distance2(best, p) {
            best = *c;
        }
    }
    best
}
