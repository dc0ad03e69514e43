//! Sorted key/value layout shared by every search kernel.
//!
//! Entries are kept in one flat, immutable buffer sorted ascending by key.
//! Equal keys form contiguous runs. Sortedness is checked once when a
//! [`SortedKv`] is built and is never re-validated per query.

use std::fmt;
use std::hash::Hash;
use std::ops::Range;

use crate::error::SearchError;
use crate::kind::SearchKind;
use crate::{exact, exponential, linear};

// =============================================================================
// Keys and entries
// =============================================================================

/// Unsigned integer key type stored in a [`SortedKv`].
///
/// Implemented for `u32` and `u64`, the two key widths used by on-disk
/// datasets.
pub trait Key:
    Copy + Ord + Hash + Default + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Widens the key losslessly.
    fn to_u64(self) -> u64;

    /// Narrows a `u64`, keeping the low `8 * WIDTH` bits.
    fn from_u64_truncating(v: u64) -> Self;

    /// Decodes a little-endian key from the first [`Key::WIDTH`] bytes.
    ///
    /// Panics if `bytes` is shorter than [`Key::WIDTH`].
    fn read_le(bytes: &[u8]) -> Self;

    /// Appends the little-endian encoding of the key.
    fn write_le(self, out: &mut Vec<u8>);
}

macro_rules! impl_key {
    ($t:ty) => {
        impl Key for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            #[inline(always)]
            fn to_u64(self) -> u64 {
                self as u64
            }

            #[inline(always)]
            fn from_u64_truncating(v: u64) -> Self {
                v as $t
            }

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$t>()];
                buf.copy_from_slice(&bytes[..std::mem::size_of::<$t>()]);
                <$t>::from_le_bytes(buf)
            }

            #[inline]
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }
        }
    };
}

impl_key!(u32);
impl_key!(u64);

/// One `(key, value)` record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct Entry<K> {
    pub key: K,
    pub value: u64,
}

impl<K> Entry<K> {
    #[inline]
    pub const fn new(key: K, value: u64) -> Self {
        Self { key, value }
    }
}

impl<K> From<(K, u64)> for Entry<K> {
    fn from((key, value): (K, u64)) -> Self {
        Self { key, value }
    }
}

// =============================================================================
// Query result
// =============================================================================

/// Aggregate over the run of a lookup key.
///
/// An absent key yields [`QueryResult::ABSENT`]; use [`QueryResult::is_found`]
/// to tell it apart from a present key whose values sum to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct QueryResult {
    /// Wrapping sum of all values whose key equals the lookup key.
    pub sum: u64,
    /// Number of matching entries.
    pub count: usize,
}

impl QueryResult {
    pub const ABSENT: QueryResult = QueryResult { sum: 0, count: 0 };

    #[inline]
    pub const fn new(sum: u64, count: usize) -> Self {
        Self { sum, count }
    }

    #[inline]
    pub const fn is_found(&self) -> bool {
        self.count > 0
    }

    #[inline(always)]
    pub(crate) fn add(&mut self, value: u64) {
        self.sum = self.sum.wrapping_add(value);
        self.count += 1;
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sum={} count={}", self.sum, self.count)
    }
}

// =============================================================================
// Kernel accessors
// =============================================================================

/// Reads `data[i]`.
///
/// Bounds-checked in debug builds. Release builds skip the check: every kernel
/// only calls this after its own loop condition has established `i < len`.
#[inline(always)]
pub(crate) fn entry_at<K>(data: &[Entry<K>], i: usize) -> &Entry<K> {
    #[cfg(debug_assertions)]
    {
        &data[i]
    }
    #[cfg(not(debug_assertions))]
    {
        // SAFETY: callers guarantee `i < data.len()`.
        unsafe { data.get_unchecked(i) }
    }
}

#[inline(always)]
pub(crate) fn key_at<K: Key>(data: &[Entry<K>], i: usize) -> K {
    entry_at(data, i).key
}

/// Accumulates the run of `key` from `pos` upwards, stopping at the first
/// different key or the end of `data`.
#[inline]
pub(crate) fn accumulate_forward<K: Key>(
    data: &[Entry<K>],
    key: K,
    mut pos: usize,
    acc: &mut QueryResult,
) {
    let len = data.len();
    while pos < len {
        let e = entry_at(data, pos);
        if e.key != key {
            break;
        }
        acc.add(e.value);
        pos += 1;
    }
}

/// Accumulates the run of `key` from `pos` (inclusive) downwards to index 0.
#[inline]
pub(crate) fn accumulate_backward<K: Key>(
    data: &[Entry<K>],
    key: K,
    pos: usize,
    acc: &mut QueryResult,
) {
    // `end` is one past the next index to read.
    let mut end = pos + 1;
    while end > 0 {
        let e = entry_at(data, end - 1);
        if e.key != key {
            break;
        }
        acc.add(e.value);
        end -= 1;
    }
}

/// Sums a run when the estimate already points inside it. The run may extend
/// in both directions; `estimate` itself is counted once.
#[inline]
pub(crate) fn accumulate_around<K: Key>(data: &[Entry<K>], key: K, estimate: usize) -> QueryResult {
    let mut acc = QueryResult::ABSENT;
    accumulate_backward(data, key, estimate, &mut acc);
    accumulate_forward(data, key, estimate + 1, &mut acc);
    acc
}

// =============================================================================
// SortedKv
// =============================================================================

/// Immutable, sorted-by-key sequence of entries.
///
/// Built once and read-only afterwards, so a single instance can serve
/// queries from any number of threads without synchronization.
#[derive(Clone, PartialEq, Eq)]
pub struct SortedKv<K> {
    entries: Box<[Entry<K>]>,
}

impl<K: Key> SortedKv<K> {
    /// Wraps entries that are already sorted by key.
    ///
    /// Fails with [`SearchError::Unsorted`] naming the first entry whose key is
    /// smaller than its predecessor's.
    pub fn from_sorted(entries: Vec<Entry<K>>) -> Result<Self, SearchError> {
        if let Some(i) = entries.windows(2).position(|w| w[0].key > w[1].key) {
            return Err(SearchError::Unsorted { index: i + 1 });
        }
        Ok(Self {
            entries: entries.into_boxed_slice(),
        })
    }

    /// Sorts the entries by key. Equal keys keep their input order.
    pub fn from_unsorted(mut entries: Vec<Entry<K>>) -> Self {
        entries.sort_by_key(|e| e.key);
        Self {
            entries: entries.into_boxed_slice(),
        }
    }

    /// Sorts `keys` and gives each entry its final position as value.
    pub fn from_keys(mut keys: Vec<K>) -> Self {
        keys.sort_unstable();
        let entries: Vec<Entry<K>> = keys
            .into_iter()
            .enumerate()
            .map(|(i, key)| Entry::new(key, i as u64))
            .collect();
        Self {
            entries: entries.into_boxed_slice(),
        }
    }

    /// Keeps only the first entry of every run.
    pub fn dedup_keys(self) -> Self {
        let mut entries = self.entries.into_vec();
        entries.dedup_by_key(|e| e.key);
        Self {
            entries: entries.into_boxed_slice(),
        }
    }

    /// True if no key occurs more than once.
    pub fn is_unique(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].key != w[1].key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Entry<K>] {
        &self.entries
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Entry<K>> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry<K>> {
        self.entries.iter()
    }

    pub fn min_key(&self) -> Option<K> {
        self.entries.first().map(|e| e.key)
    }

    pub fn max_key(&self) -> Option<K> {
        self.entries.last().map(|e| e.key)
    }

    /// Index range of the run of `key`.
    ///
    /// When the key is absent the range is empty and starts at the position
    /// the key would be inserted at.
    pub fn equal_range(&self, key: K) -> Range<usize> {
        let lo = self.entries.partition_point(|e| e.key < key);
        let hi = lo + self.entries[lo..].partition_point(|e| e.key == key);
        lo..hi
    }

    // -------------------------------------------------------------------------
    // Checked query API
    // -------------------------------------------------------------------------

    /// Runs `kind` for `key`.
    ///
    /// Without an estimate this is an exact search, whatever `kind` is. An
    /// estimate is validated against the store before any kernel reads it.
    pub fn search(
        &self,
        kind: SearchKind,
        key: K,
        estimate: Option<usize>,
    ) -> Result<QueryResult, SearchError> {
        match estimate {
            None => Ok(exact::search(&self.entries, key, None)),
            Some(estimate) => {
                self.check_estimate(estimate)?;
                Ok(kind.run(&self.entries, key, estimate))
            }
        }
    }

    /// Exact search over the whole store or a sub-range of it.
    pub fn exact(&self, key: K, range: Option<Range<usize>>) -> Result<QueryResult, SearchError> {
        if let Some(r) = &range {
            if r.start > r.end || r.end > self.len() {
                return Err(SearchError::InvalidRange {
                    start: r.start,
                    end: r.end,
                    len: self.len(),
                });
            }
        }
        Ok(exact::search(&self.entries, key, range))
    }

    /// Bounded-displacement search from `estimate`.
    pub fn linear(&self, key: K, estimate: usize) -> Result<QueryResult, SearchError> {
        self.check_estimate(estimate)?;
        Ok(linear::search(&self.entries, key, estimate))
    }

    /// Exponential-displacement search from `estimate`.
    pub fn exponential(&self, key: K, estimate: usize) -> Result<QueryResult, SearchError> {
        self.check_estimate(estimate)?;
        Ok(exponential::search(&self.entries, key, estimate))
    }

    fn check_estimate(&self, estimate: usize) -> Result<(), SearchError> {
        if self.entries.is_empty() {
            return Err(SearchError::EmptyStore);
        }
        if estimate >= self.entries.len() {
            return Err(SearchError::EstimateOutOfRange {
                estimate,
                len: self.entries.len(),
            });
        }
        Ok(())
    }
}

impl<K: Key> From<SortedKv<K>> for Vec<Entry<K>> {
    fn from(kv: SortedKv<K>) -> Self {
        kv.entries.into_vec()
    }
}

impl<'a, K> IntoIterator for &'a SortedKv<K> {
    type Item = &'a Entry<K>;
    type IntoIter = std::slice::Iter<'a, Entry<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: fmt::Debug> fmt::Debug for SortedKv<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedKv")
            .field("len", &self.entries.len())
            .field("first", &self.entries.first())
            .field("last", &self.entries.last())
            .finish()
    }
}
