#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod dispatch;
pub mod guard;
pub mod source;

#[cfg(test)]
pub(crate) mod test_utils;

pub use dispatch::{process_if_not_empty, NonEmpty, ProcessIfNotEmpty};
pub use guard::{GuardedIter, ReleasedError, ReplayIter};
pub use source::Source;
