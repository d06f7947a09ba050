//! A release-once guard around a single-use iterator.
//!
//! A lazy pipeline hands out one forward pass and nothing else. Once the
//! dispatcher has peeked at it, that pass is the only one there will ever
//! be, so the iterator must not be driven by anything except the replayed
//! sequence built on top of it, and must not be driven at all once the
//! dispatch call is over. [`GuardedIter`] enforces this: it owns the
//! iterator, checks an atomic released flag before every pull, and drops
//! the iterator exactly once no matter how many threads race to release it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Error returned when a [`GuardedIter`] is driven after its release.
///
/// This signals a programming error: a sequence handed to a dispatch
/// callback was kept around and iterated after the call ended.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "cannot use a guarded iterator once it has been released; \
    collect the elements into a Vec if they must outlive the call"
)]
pub struct ReleasedError;

/// A single-use iterator behind a release-once guard.
///
/// The guard starts out open. [`release`](GuardedIter::release) closes it,
/// dropping the wrapped iterator; the transition is atomic, happens at most
/// once, and is terminal. Every pull goes through
/// [`try_next`](GuardedIter::try_next), which fails with [`ReleasedError`]
/// on a closed guard instead of handing back stale data.
///
/// Dropping the guard releases it, so a guard bound to a scope cleans up on
/// every exit path, unwinding included.
#[derive(Debug)]
pub struct GuardedIter<I> {
    iter: Mutex<Option<I>>,
    released: AtomicBool,
}

impl<I> GuardedIter<I> {
    /// Wrap `iter` in an open guard.
    pub fn new(iter: I) -> Self {
        Self {
            iter: Mutex::new(Some(iter)),
            released: AtomicBool::new(false),
        }
    }

    /// Whether the guard has been released.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Release the guard, dropping the wrapped iterator.
    ///
    /// The first call performs the drop; all later calls are no-ops. Under
    /// concurrent calls the atomic swap picks a single winner, so the
    /// wrapped iterator is dropped exactly once. Returns whether this call
    /// was the one that released.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.iter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        true
    }

    fn ensure_open(&self) -> Result<(), ReleasedError> {
        if self.is_released() {
            return Err(ReleasedError);
        }
        Ok(())
    }
}

impl<I: Iterator> GuardedIter<I> {
    /// Pull the next element from the wrapped iterator.
    ///
    /// Fails with [`ReleasedError`] if the guard has been released,
    /// deterministically and every time.
    pub fn try_next(&mut self) -> Result<Option<I::Item>, ReleasedError> {
        self.ensure_open()?;
        let iter = self.iter.get_mut().unwrap_or_else(PoisonError::into_inner);
        Ok(iter.as_mut().and_then(Iterator::next))
    }
}

impl<I> Drop for GuardedIter<I> {
    fn drop(&mut self) {
        self.release();
    }
}

/// The replayed view of a non-empty single-use iterator.
///
/// Yields the lookahead element that was already pulled out of the guard,
/// then drains the remainder through the guard one element at a time.
/// Nothing beyond the lookahead element is ever buffered. The iterator is
/// single-pass and borrows the guard for as long as it lives.
pub struct ReplayIter<'g, I: Iterator> {
    head: Option<I::Item>,
    guard: &'g mut GuardedIter<I>,
}

impl<'g, I: Iterator> ReplayIter<'g, I> {
    /// Resume iteration over `guard` after `head` was pulled as lookahead.
    pub fn new(head: I::Item, guard: &'g mut GuardedIter<I>) -> Self {
        Self {
            head: Some(head),
            guard,
        }
    }
}

impl<I: Iterator> Iterator for ReplayIter<'_, I> {
    type Item = I::Item;

    /// # Panics
    ///
    /// Panics if the guard was released before the replay was drained.
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(head) = self.head.take() {
            return Some(head);
        }
        match self.guard.try_next() {
            Ok(elem) => elem,
            Err(err) => panic!("{err}"),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::from(self.head.is_some()), None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::thread;

    use itertools::Itertools;

    use super::*;
    use crate::test_utils::DropSpy;

    #[test]
    fn replay_yields_head_then_remainder() {
        let mut guard = GuardedIter::new([5, 3, 1].into_iter());
        let head = guard.try_next().unwrap().unwrap();
        assert_eq!(head, 5);

        let replay = ReplayIter::new(head, &mut guard);
        assert_eq!(replay.collect_vec(), vec![5, 3, 1]);
    }

    #[test]
    fn try_next_after_release_fails_every_time() {
        let mut guard = GuardedIter::new([1, 2].into_iter());
        guard.release();
        assert_eq!(guard.try_next(), Err(ReleasedError));
        assert_eq!(guard.try_next(), Err(ReleasedError));
    }

    #[test]
    fn release_drops_the_iterator_once() {
        let (spy, drops) = DropSpy::new([1, 2].into_iter());
        let guard = GuardedIter::new(spy);

        assert!(guard.release());
        assert!(!guard.release());
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        drop(guard);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_the_guard_releases_it() {
        let (spy, drops) = DropSpy::new([1].into_iter());
        let guard = GuardedIter::new(spy);
        assert!(!guard.is_released());

        drop(guard);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn racing_releases_pick_a_single_winner() {
        for _ in 0..64 {
            let (spy, drops) = DropSpy::new(0..10);
            let guard = GuardedIter::new(spy);

            let (a, b) = thread::scope(|s| {
                let t1 = s.spawn(|| guard.release());
                let t2 = s.spawn(|| guard.release());
                (t1.join().unwrap(), t2.join().unwrap())
            });

            assert!(a ^ b);
            assert_eq!(drops.load(Ordering::SeqCst), 1);
            assert!(guard.is_released());
        }
    }

    #[test]
    #[should_panic(expected = "released")]
    fn replay_panics_on_a_released_guard() {
        let mut guard = GuardedIter::new([1, 2].into_iter());
        let head = guard.try_next().unwrap().unwrap();
        guard.release();

        let mut replay = ReplayIter::new(head, &mut guard);
        // the buffered head is still available...
        assert_eq!(replay.next(), Some(1));
        // ...but pulling through the released guard must fail loudly
        replay.next();
    }
}
