//! Small shared utilities.

pub mod ids;

pub use ids::{IdAllocator, MonotonicIds};
