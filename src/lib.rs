//! # learned-search
//!
//! Position-correction search kernels for learned index lookups.
//!
//! A learned model (or any other predictor) guesses where a key lives in a
//! sorted array. The guess can be arbitrarily wrong. The kernels here take the
//! guess and return the exact sum and count of all values stored under the
//! key, touching as few entries as the guess allows:
//!
//! - [`exact`]: binary search, ignores the estimate. The reference result.
//! - [`linear`]: steps one slot at a time from the estimate. Cheap for small,
//!   bounded errors.
//! - [`exponential`]: doubles its step until the key is bracketed. Cheap for
//!   large errors.
//!
//! ## Example
//!
//! ```rust
//! use learned_search::{Entry, QueryResult, SearchKind, SortedKv};
//!
//! let kv = SortedKv::from_sorted(vec![
//!     Entry::new(1u64, 10),
//!     Entry::new(3, 20),
//!     Entry::new(3, 21),
//!     Entry::new(3, 22),
//!     Entry::new(7, 30),
//! ])
//! .unwrap();
//!
//! assert_eq!(kv.linear(3, 0).unwrap(), QueryResult::new(63, 3));
//! assert_eq!(kv.exponential(1, 4).unwrap(), QueryResult::new(10, 1));
//! assert_eq!(kv.search(SearchKind::Binary, 5, None).unwrap(), QueryResult::ABSENT);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

mod error;
pub mod exact;
pub mod exponential;
mod kind;
pub mod linear;
mod store;

pub use error::SearchError;
pub use kind::SearchKind;
pub use store::{Entry, Key, QueryResult, SortedKv};


#[cfg(test)]
mod proptests;
