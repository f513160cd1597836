//! Re-export public algorithms.

pub mod locate;

pub use locate::{ClosestElement, ClosestNode};
