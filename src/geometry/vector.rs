//! Small `[f64; 3]` vector helpers shared by the geometry kernels.

/// A point or vector in 3D.
pub type Point = [f64; 3];

#[inline]
pub fn add(a: Point, b: Point) -> Point {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn sub(a: Point, b: Point) -> Point {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn scale(a: Point, s: f64) -> Point {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn dot(a: Point, b: Point) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: Point, b: Point) -> Point {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn norm(a: Point) -> f64 {
    dot(a, a).sqrt()
}

/// Squared Euclidean distance.
#[inline]
pub fn distance2(a: Point, b: Point) -> f64 {
    let d = sub(a, b);
    dot(d, d)
}

/// Arithmetic mean of a non-empty set of points.
pub fn centroid(points: impl IntoIterator<Item = Point>) -> Point {
    let mut sum = [0.0; 3];
    let mut n = 0usize;
    for p in points {
        sum = add(sum, p);
        n += 1;
    }
    if n == 0 {
        return sum;
    }
    scale(sum, 1.0 / n as f64)
}
