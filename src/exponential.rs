//! Exponential-displacement search.
//!
//! Brackets the key with doubling steps away from the estimate, then closes
//! the remaining gap linearly. Positioning costs O(log d) for a displacement
//! of d, so large predictor errors stay cheap.

use crate::store::{accumulate_around, accumulate_forward, key_at};
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
    if here == key {
        return accumulate_around(data, key, estimate);
    }

    let start = if here < key {
        gallop_up(data, key, estimate)
    } else {
        gallop_down(data, key, estimate)
    };

    // `start` is at or below the first key >= lookup key.
    let mut pos = start;
    while pos < len && key_at(data, pos) < key {
        pos += 1;
    }

    let mut result = QueryResult::ABSENT;
    accumulate_forward(data, key, pos, &mut result);
    result
}

/// Returns the last probed index whose key is still below `key`.
///
/// `data[from].key < key` on entry.
#[inline]
fn gallop_up<K: Key>(data: &[Entry<K>], key: K, from: usize) -> usize {
    let len = data.len();
    let mut step = 1usize;
    let mut last_low = from;
    let mut probe = from.saturating_add(step);
    while probe < len && key_at(data, probe) < key {
        last_low = probe;
        step = step.saturating_mul(2);
        probe = probe.saturating_add(step);
    }
    last_low
}

/// Returns an index whose key is below `key`, or 0.
///
/// `data[from].key > key` on entry.
#[inline]
fn gallop_down<K: Key>(data: &[Entry<K>], key: K, from: usize) -> usize {
    let mut step = 1usize;
    let mut probe = from;
    loop {
        probe = match probe.checked_sub(step) {
            Some(p) => p,
            None => return 0,
        };
        if probe == 0 || key_at(data, probe) < key {
            return probe;
        }
        step = step.saturating_mul(2);
    }
}
