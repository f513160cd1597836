//! Axis-aligned bounding box over `[f64; 3]` points.

use super::vector::{Point, norm, sub};

/// An axis-aligned bounding box.
///
/// A freshly created box is *invalid* (min > max) and becomes valid once a
/// point is added.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    /// Minimum corner.
    pub min: Point,
    /// Maximum corner.
    pub max: Point,
}

impl Default for BBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BBox {
    /// An empty (invalid) box, the neutral element for [`BBox::extend`].
    pub const fn empty() -> Self {
        BBox {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    /// Box spanned by two corners, in any order.
    pub fn new(a: Point, b: Point) -> Self {
        BBox {
            min: [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])],
            max: [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])],
        }
    }

    /// Smallest box containing all `points`; empty when there are none.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        let mut b = Self::empty();
        for p in points {
            b.extend(p);
        }
        b
    }

    /// Bounding box of a point slice. Uses a parallel reduction when the
    /// `rayon` feature is enabled.
    #[cfg(feature = "rayon")]
    pub fn of_points(points: &[Point]) -> Self {
        use rayon::prelude::*;
        points
            .par_iter()
            .fold(Self::empty, |mut b, p| {
                b.extend(*p);
                b
            })
            .reduce(Self::empty, |mut a, b| {
                a.merge(&b);
                a
            })
    }

    /// Bounding box of a point slice.
    #[cfg(not(feature = "rayon"))]
    pub fn of_points(points: &[Point]) -> Self {
        Self::from_points(points.iter().copied())
    }

    /// `true` once at least one point has been added.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min[0] <= self.max[0] && self.min[1] <= self.max[1] && self.min[2] <= self.max[2]
    }

    /// Grows the box to include `p`.
    #[inline]
    pub fn extend(&mut self, p: Point) {
        for a in 0..3 {
            self.min[a] = self.min[a].min(p[a]);
            self.max[a] = self.max[a].max(p[a]);
        }
    }

    /// Grows the box to include another box.
    pub fn merge(&mut self, other: &BBox) {
        if other.is_valid() {
            self.extend(other.min);
            self.extend(other.max);
        }
    }

    /// Pads a valid box by `margin` on every side.
    pub fn pad(&mut self, margin: f64) {
        if !self.is_valid() {
            return;
        }
        for a in 0..3 {
            self.min[a] -= margin;
            self.max[a] += margin;
        }
    }

    /// Returns a copy padded by `margin`.
    pub fn padded(mut self, margin: f64) -> Self {
        self.pad(margin);
        self
    }

    /// Diagonal vector `max - min` (zero for an invalid box).
    pub fn diagonal(&self) -> Point {
        if self.is_valid() {
            sub(self.max, self.min)
        } else {
            [0.0; 3]
        }
    }

    /// Length of the diagonal.
    pub fn diagonal_length(&self) -> f64 {
        norm(self.diagonal())
    }

    /// Closed containment test.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        (0..3).all(|a| p[a] >= self.min[a] && p[a] <= self.max[a])
    }

    /// `true` when the two boxes share at least one point.
    pub fn overlaps(&self, other: &BBox) -> bool {
        (0..3).all(|a| self.min[a] <= other.max[a] && other.min[a] <= self.max[a])
    }
}
