use thiserror::Error;

/// Caller errors detected by the checked [`SortedKv`](crate::SortedKv) API.
///
/// A missing key is not an error; it is reported as
/// [`QueryResult::ABSENT`](crate::QueryResult::ABSENT).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// An estimate was supplied for a store with no entries.
    #[error("estimate supplied for an empty store")]
    EmptyStore,

    /// The estimate does not index into the store.
    #[error("estimate {estimate} out of range for store of length {len}")]
    EstimateOutOfRange { estimate: usize, len: usize },

    /// An exact-search sub-range is reversed or exceeds the store.
    #[error("range {start}..{end} invalid for store of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// Construction input was not sorted by key.
    #[error("entries not sorted by key at index {index}")]
    Unsorted { index: usize },

    /// A search strategy name did not parse.
    #[error("unknown search kind '{name}' (expected binary, linear or exponential)")]
    UnknownKind { name: String },
}
