//! Round-robin selection.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Round-robin selector.
/// Stores an internal counter to rotate through a slice.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next item in rotation, or `None` for an empty slice.
    pub fn next<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }

        let idx = self.counter.fetch_add(1, Ordering::Relaxed);
        items.get(idx % items.len())
    }
}
