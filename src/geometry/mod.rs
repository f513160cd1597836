//! Geometric kernels used by the mesh.
//!
//! Points are plain `[f64; 3]` arrays; the helpers here are free functions
//! over them, plus the axis-aligned [`bbox::BBox`], closest-point routines and
//! the uniform [`search_grid::SearchGrid`] used for point location.

pub mod bbox;
pub mod closest;
pub mod quality;
pub mod search_grid;
pub mod vector;

pub use bbox::BBox;
pub use search_grid::SearchGrid;
pub use vector::Point;
