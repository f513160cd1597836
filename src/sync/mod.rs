//! Lazy construction of derived mesh tables.

pub mod coordinator;
pub mod mask;

pub use coordinator::{BuildStats, Coordinator, Dispatch};
pub use mask::{Table, TableMask, expand};
