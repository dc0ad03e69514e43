//! Estimate-oblivious exact search.
//!
//! Binary search for the first occurrence of the key, then a forward walk over
//! its run. O(log n + m) for a run of length m. Every other strategy must agree
//! with this one.

use std::ops::Range;

use tracing::{debug, warn};

use crate::store::{accumulate_forward, key_at, Entry, Key, QueryResult};

/// First index in `range` whose key is `>= key`, or `range.end` if none is.
///
/// Panics if `range` is reversed or extends past `data`.
#[inline]
pub fn lower_bound<K: Key>(data: &[Entry<K>], key: K, range: Range<usize>) -> usize {
    range.start + data[range.clone()].partition_point(|e| e.key < key)
}

/// Sum and count over the run of `key`.
///
/// With `range` the first occurrence is searched only in that sub-range; the
/// run itself is summed to its end even past `range.end`. An absent key gives
/// [`QueryResult::ABSENT`] and a diagnostic event, never a failure.
///
/// Panics if `range` is reversed or extends past `data`.
pub fn search<K: Key>(data: &[Entry<K>], key: K, range: Option<Range<usize>>) -> QueryResult {
    let bounded = range.is_some();
    let range = range.unwrap_or(0..data.len());
    let pos = lower_bound(data, key, range.clone());

    if pos == range.end || key_at(data, pos) != key {
        if bounded {
            report_range_miss(data, key, &range);
        } else {
            debug!(target: "learned_search", %key, "key not found");
        }
        return QueryResult::ABSENT;
    }

    let mut result = QueryResult::ABSENT;
    accumulate_forward(data, key, pos, &mut result);
    result
}

/// A bounded search that misses is only suspicious when the key does exist
/// elsewhere: the caller's bracket was wrong.
#[cold]
fn report_range_miss<K: Key>(data: &[Entry<K>], key: K, range: &Range<usize>) {
    let correct = lower_bound(data, key, 0..data.len());
    if correct < data.len() && key_at(data, correct) == key {
        warn!(
            target: "learned_search",
            %key,
            start = range.start,
            end = range.end,
            correct_index = correct,
            "key not found in range"
        );
    } else {
        debug!(
            target: "learned_search",
            %key,
            start = range.start,
            end = range.end,
            "key not found"
        );
    }
}
