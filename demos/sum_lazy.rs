//! Sum a lazily filtered range, but only if it yields anything.
//!
//! The pipeline below is single-use and has a side effect per pull; the
//! dispatcher still only runs it once, lookahead included.

use if_not_empty::{process_if_not_empty, ProcessIfNotEmpty, Source};

fn lazy_items() -> impl Iterator<Item = i32> {
    (0..100).rev().inspect(|i| println!("pulled {i}")).filter(|&i| i < 10)
}

fn main() {
    let total: Option<i32> = lazy_items().process_if_not_empty(|seq| Some(seq.sum()), || None);
    println!("lazy sum: {total:?}");

    let realized = vec![5, 3, 1];
    let total = process_if_not_empty(
        Source::sized(realized.iter().copied()),
        |seq| Some(seq.sum::<i32>()),
        || None,
    );
    println!("realized sum: {total:?}");
}
