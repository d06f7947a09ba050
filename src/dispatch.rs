//! Emptiness dispatch over a classified [`Source`].
//!
//! One pass, never two: an absent or empty source goes straight to the
//! default producer; a non-empty sized source is handed to the handler
//! untouched; an opaque source is probed with a single lookahead pull and,
//! if it yielded, replayed to the handler through its guard.

use std::iter::Empty;

use delegate::delegate;

use crate::guard::{GuardedIter, ReplayIter};
use crate::source::Source;

/// A sequence that was found to be non-empty at dispatch time.
///
/// This is what the non-empty handler receives: either the original sized
/// iterator, with nothing consumed, or the replayed view of an opaque one.
/// Both yield every element of the source in order.
pub enum NonEmpty<'g, S, I: Iterator> {
    /// The original sized iterator, untouched by the dispatcher.
    Sized(S),
    /// The replayed view of an opaque iterator: the lookahead element
    /// followed by the remainder, pulled through the guard on demand.
    Replayed(ReplayIter<'g, I>),
}

impl<S, I> NonEmpty<'_, S, I>
where
    S: ExactSizeIterator,
    I: Iterator<Item = S::Item>,
{
    /// The number of remaining elements, when known without iterating.
    ///
    /// `Some` for sized sources, `None` for replayed ones. Answering a
    /// count query through this method pulls no elements.
    pub fn exact_len(&self) -> Option<usize> {
        match self {
            NonEmpty::Sized(iter) => Some(iter.len()),
            NonEmpty::Replayed(_) => None,
        }
    }
}

impl<S, I> Iterator for NonEmpty<'_, S, I>
where
    S: ExactSizeIterator,
    I: Iterator<Item = S::Item>,
{
    type Item = S::Item;

    delegate! {
        to match self {
            NonEmpty::Sized(iter) => iter,
            NonEmpty::Replayed(iter) => iter,
        } {
            fn next(&mut self) -> Option<S::Item>;
            fn size_hint(&self) -> (usize, Option<usize>);
        }
    }
}

/// Dispatch on the emptiness of `source` without iterating it twice.
///
/// Invokes `on_non_empty` with the sequence if it yields at least one
/// element, `on_empty` otherwise, and returns whatever the invoked callback
/// returns. Absent and sized sources are classified without pulling a
/// single element; an opaque source costs exactly one lookahead pull, which
/// the handler gets back as the first element of its sequence.
///
/// The opaque source's iterator is owned by a [`GuardedIter`] for the
/// duration of the call and released on every exit path, so a callback that
/// panics still leaves the iterator cleanly dropped. Errors raised by
/// callbacks or by the underlying iterator propagate unchanged.
///
/// ```
/// use if_not_empty::{process_if_not_empty, Source};
///
/// let total = process_if_not_empty(
///     Source::sized([5, 3, 1].iter().copied()),
///     |seq| Some(seq.sum::<i32>()),
///     || None,
/// );
/// assert_eq!(total, Some(9));
/// ```
pub fn process_if_not_empty<S, I, R>(
    source: Source<S, I>,
    on_non_empty: impl FnOnce(NonEmpty<'_, S, I>) -> R,
    on_empty: impl FnOnce() -> R,
) -> R
where
    S: ExactSizeIterator,
    I: Iterator<Item = S::Item>,
{
    match source {
        Source::Absent => on_empty(),
        Source::Sized(iter) => {
            if iter.len() == 0 {
                on_empty()
            } else {
                on_non_empty(NonEmpty::Sized(iter))
            }
        }
        Source::Opaque(iter) => {
            let mut guard = GuardedIter::new(iter);
            // the guard releases itself when it goes out of scope, on the
            // unwind path included
            match guard.try_next().expect("freshly wrapped guard is open") {
                Some(head) => on_non_empty(NonEmpty::Replayed(ReplayIter::new(head, &mut guard))),
                None => on_empty(),
            }
        }
    }
}

/// Extension-method form of [`process_if_not_empty`] for plain iterators.
pub trait ProcessIfNotEmpty: Iterator + Sized {
    /// Treat `self` as an opaque single-use sequence and dispatch on its
    /// emptiness. See [`process_if_not_empty`].
    ///
    /// ```
    /// use if_not_empty::ProcessIfNotEmpty;
    ///
    /// let no_evens = (1..10).filter(|n| n % 2 == 0).map(|n| n * 100);
    /// let first = no_evens.process_if_not_empty(|mut seq| seq.next(), || None);
    /// assert_eq!(first, Some(200));
    /// ```
    fn process_if_not_empty<R>(
        self,
        on_non_empty: impl FnOnce(NonEmpty<'_, Empty<Self::Item>, Self>) -> R,
        on_empty: impl FnOnce() -> R,
    ) -> R {
        process_if_not_empty(Source::opaque(self), on_non_empty, on_empty)
    }
}

impl<I: Iterator> ProcessIfNotEmpty for I {}
