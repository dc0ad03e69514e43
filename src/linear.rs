//! Bounded-displacement search.
//!
//! Walks one slot at a time from the estimate towards the key's run. Cost is
//! proportional to the distance between estimate and run, so this is the
//! right choice when the predictor's error is known to be small.

use crate::store::{accumulate_around, accumulate_backward, accumulate_forward, key_at};
use crate::store::{Entry, Key, QueryResult};

/// Sum and count over the run of `key`, starting from `estimate`.
///
/// Panics if `estimate >= data.len()`.
pub fn search<K: Key>(data: &[Entry<K>], key: K, estimate: usize) -> QueryResult {
    let len = data.len();
    assert!(
        estimate < len,
        "estimate {estimate} out of range for {len} entries"
    );

    let here = key_at(data, estimate);

    if here < key {
        // Too low: move up to the first key >= lookup key.
        let mut pos = estimate + 1;
        while pos < len && key_at(data, pos) < key {
            pos += 1;
        }
        let mut result = QueryResult::ABSENT;
        accumulate_forward(data, key, pos, &mut result);
        return result;
    }

    if here > key {
        // Too high: move down to the last key <= lookup key.
        let mut pos = estimate;
        while pos > 0 && key_at(data, pos) > key {
            pos -= 1;
        }
        let mut result = QueryResult::ABSENT;
        if key_at(data, pos) == key {
            accumulate_backward(data, key, pos, &mut result);
        }
        return result;
    }

    accumulate_around(data, key, estimate)
}
