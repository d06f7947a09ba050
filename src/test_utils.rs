//! Iterator doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Wraps an iterator and counts how many times it is dropped.
///
/// The count is the observable stand-in for "the underlying resources were
/// released": it must end up at exactly one, on every code path.
pub(crate) struct DropSpy<I> {
    iter: I,
    drops: Arc<AtomicUsize>,
}

impl<I> DropSpy<I> {
    pub(crate) fn new(iter: I) -> (Self, Arc<AtomicUsize>) {
        let drops = Arc::new(AtomicUsize::new(0));
        let spy = Self {
            iter,
            drops: Arc::clone(&drops),
        };
        (spy, drops)
    }
}

impl<I: Iterator> Iterator for DropSpy<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}

impl<I> Drop for DropSpy<I> {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}
