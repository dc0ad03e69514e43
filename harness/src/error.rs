use std::io;

use learned_search::{QueryResult, SearchError};
use thiserror::Error;

/// Errors raised while loading data or driving a workload.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Dataset file shorter than its header promises.
    #[error("dataset truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes the header and record width require
        expected: u64,
        /// Bytes actually present
        actual: u64,
    },

    /// File name does not end in a known `_uint32` / `_uint64` suffix.
    #[error("type '{suffix}' not supported")]
    UnsupportedType {
        /// Text after the last `_`, empty if there was none
        suffix: String,
    },

    /// Caller error reported by the search core.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// `sched_setaffinity` refused the requested core.
    #[error("failed to pin thread to core {core}: {source}")]
    Affinity {
        /// Requested core index
        core: u32,
        /// OS error from the affinity call
        #[source]
        source: io::Error,
    },

    /// A kernel disagreed with the precomputed expected result.
    #[error("lookup of key {key} returned {actual}, expected {expected}")]
    ResultMismatch {
        /// Lookup key, widened
        key: u64,
        /// Answer from exact search
        expected: QueryResult,
        /// Answer from the strategy under test
        actual: QueryResult,
    },
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
