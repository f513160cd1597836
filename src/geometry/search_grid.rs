//! Uniform bucket grid over a bounding box.
//!
//! Items are inserted either as points (one cell) or as boxes (every cell the
//! box overlaps). Nearest-item searches walk outward from the cell holding
//! the query point one ring of cells at a time and stop after the first ring
//! in which no cell can hold anything closer than the best hit so far.

use std::ops::ControlFlow;

use super::bbox::BBox;
use super::vector::Point;

/// Cell index triple.
pub type CellIndex = [usize; 3];

/// A 3D grid of buckets holding `T` handles.
#[derive(Debug, Clone)]
pub struct SearchGrid<T> {
    bounds: BBox,
    dims: [usize; 3],
    cell_size: [f64; 3],
    inv_cell_size: [f64; 3],
    cells: Vec<Vec<T>>,
}

impl<T: Copy> SearchGrid<T> {
    /// Empty grid over `bounds` with the given number of cells per axis
    /// (each at least 1).
    pub fn new(bounds: BBox, dims: [usize; 3]) -> Self {
        let dims = dims.map(|d| d.max(1));
        let bounds = if bounds.is_valid() {
            bounds
        } else {
            BBox::new([0.0; 3], [0.0; 3])
        };
        let extent = bounds.diagonal();
        let mut cell_size = [0.0; 3];
        let mut inv_cell_size = [0.0; 3];
        for a in 0..3 {
            cell_size[a] = extent[a] / dims[a] as f64;
            if cell_size[a] > 0.0 {
                inv_cell_size[a] = 1.0 / cell_size[a];
            }
        }
        SearchGrid {
            bounds,
            dims,
            cell_size,
            inv_cell_size,
            cells: vec![Vec::new(); dims[0] * dims[1] * dims[2]],
        }
    }

    /// Grid sized for `count` items spread over `bbox`, padded by `margin`.
    ///
    /// The total resolution is `3 * trunc(ceil(cbrt(count)) / 2 + 1)` cells,
    /// distributed over the axes in proportion to the box's extent.
    pub fn sized_for(bbox: &BBox, count: usize, margin: f64) -> Self {
        let dims = grid_dims(bbox, count);
        log::trace!("search grid {:?} for {} items", dims, count);
        SearchGrid::new(bbox.padded(margin), dims)
    }

    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Padded bounds covered by the cells.
    #[inline]
    pub fn bounds(&self) -> &BBox {
        &self.bounds
    }

    #[inline]
    fn flat(&self, [i, j, k]: CellIndex) -> usize {
        (i * self.dims[1] + j) * self.dims[2] + k
    }

    fn axis_coord(&self, p: Point, a: usize) -> i64 {
        ((p[a] - self.bounds.min[a]) * self.inv_cell_size[a]).floor() as i64
    }

    /// Cell containing `p`, or `None` when `p` lies outside the grid.
    pub fn locate(&self, p: Point) -> Option<CellIndex> {
        if !self.bounds.contains(p) {
            return None;
        }
        Some(self.locate_clamp(p))
    }

    /// Cell containing `p`, clamped to the nearest cell when outside.
    pub fn locate_clamp(&self, p: Point) -> CellIndex {
        let mut out = [0usize; 3];
        for a in 0..3 {
            let c = self.axis_coord(p, a);
            out[a] = c.clamp(0, self.dims[a] as i64 - 1) as usize;
        }
        out
    }

    /// Adds `item` to the cell containing `p` (clamped).
    pub fn insert_point(&mut self, item: T, p: Point) {
        let idx = self.flat(self.locate_clamp(p));
        self.cells[idx].push(item);
    }

    /// Adds `item` to every cell overlapped by `bbox`.
    pub fn insert_box(&mut self, item: T, bbox: &BBox) {
        for ijk in self.cells_overlapping(bbox) {
            let idx = self.flat(ijk);
            self.cells[idx].push(item);
        }
    }

    /// Cells overlapped by `bbox` (clamped to the grid).
    pub fn cells_overlapping(&self, bbox: &BBox) -> impl Iterator<Item = CellIndex> + use<T> {
        let lo = self.locate_clamp(bbox.min);
        let hi = self.locate_clamp(bbox.max);
        (lo[0]..=hi[0]).flat_map(move |i| {
            (lo[1]..=hi[1]).flat_map(move |j| (lo[2]..=hi[2]).map(move |k| [i, j, k]))
        })
    }

    /// Items stored in one cell.
    pub fn lookup_ijk(&self, ijk: CellIndex) -> &[T] {
        &self.cells[self.flat(ijk)]
    }

    /// Items stored in the cell containing `p`; empty outside the grid.
    pub fn lookup(&self, p: Point) -> &[T] {
        match self.locate(p) {
            Some(ijk) => self.lookup_ijk(ijk),
            None => &[],
        }
    }

    /// Squared distance from `p` to the closest point of a cell (0 inside).
    pub fn min_distance_squared(&self, p: Point, ijk: CellIndex) -> f64 {
        let mut d2 = 0.0;
        for a in 0..3 {
            let lo = self.bounds.min[a] + ijk[a] as f64 * self.cell_size[a];
            let hi = lo + self.cell_size[a];
            let d = if p[a] < lo {
                lo - p[a]
            } else if p[a] > hi {
                p[a] - hi
            } else {
                0.0
            };
            d2 += d * d;
        }
        d2
    }

    /// Cells at Chebyshev distance exactly `ring` from `center`, clipped to
    /// the grid.
    fn ring_cells(&self, center: CellIndex, ring: usize) -> Vec<CellIndex> {
        let r = ring as i64;
        let range = |a: usize| {
            let c = center[a] as i64;
            ((c - r).max(0), (c + r).min(self.dims[a] as i64 - 1))
        };
        let (i0, i1) = range(0);
        let (j0, j1) = range(1);
        let (k0, k1) = range(2);
        let ck = center[2] as i64;

        let mut out = Vec::new();
        for i in i0..=i1 {
            let i_edge = (i - center[0] as i64).abs() == r;
            for j in j0..=j1 {
                let j_edge = (j - center[1] as i64).abs() == r;
                if i_edge || j_edge {
                    for k in k0..=k1 {
                        out.push([i as usize, j as usize, k as usize]);
                    }
                } else {
                    // interior column: only the two caps belong to the ring
                    for k in [ck - r, ck + r] {
                        if k >= k0 && k <= k1 {
                            out.push([i as usize, j as usize, k as usize]);
                        }
                    }
                }
            }
        }
        out
    }

    /// Expanding-ring search around `p`.
    ///
    /// `best` is the initial squared search radius. `visit` is called with
    /// the contents of every cell that could still hold an item closer than
    /// the current radius; it returns the updated radius, or `Break` to end
    /// the search early. Returns the final radius.
    pub fn shell_search<F>(&self, p: Point, mut best: f64, mut visit: F) -> f64
    where
        F: FnMut(&[T], f64) -> ControlFlow<f64, f64>,
    {
        let center = self.locate_clamp(p);
        let max_ring = self.dims.iter().copied().max().unwrap_or(1);
        for ring in 0..=max_ring {
            let mut expanded = false;
            for ijk in self.ring_cells(center, ring) {
                if self.min_distance_squared(p, ijk) < best {
                    expanded = true;
                    match visit(self.lookup_ijk(ijk), best) {
                        ControlFlow::Continue(d) => best = d,
                        ControlFlow::Break(d) => return d,
                    }
                }
            }
            if !expanded {
                break;
            }
        }
        best
    }
}

/// Cells per axis for `count` items over `bbox`.
pub fn grid_dims(bbox: &BBox, count: usize) -> [usize; 3] {
    let s = 3.0 * ((count.max(1) as f64).cbrt().ceil() / 2.0 + 1.0).trunc();
    let diag = bbox.diagonal();
    let trace = diag[0] + diag[1] + diag[2];
    if !(trace > 0.0) {
        return [1, 1, 1];
    }
    diag.map(|d| ((0.5 + d / trace * s).ceil() as usize).max(1))
}
