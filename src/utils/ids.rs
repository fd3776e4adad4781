//! Request id allocation.
//!
//! Id sequences are injected rather than global so tests can pin them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of unique, increasing ids.
pub trait IdAllocator: Send + Sync + fmt::Debug {
    fn next_id(&self) -> u64;
}

/// Monotonic counter starting at a chosen value.
#[derive(Debug)]
pub struct MonotonicIds {
    next: AtomicU64,
}

impl MonotonicIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for MonotonicIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator for MonotonicIds {
    fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
