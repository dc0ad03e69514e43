//! Position estimators.
//!
//! The search kernels accept an estimate from anywhere; these are the sources
//! the harness feeds them. Every prediction is clamped into `[0, len)` so it
//! always satisfies the kernels' precondition on a non-empty store.

use learned_search::{Key, SortedKv};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Largest radix table the harness will allocate (2^24 hints).
pub const MAX_RADIX_BITS: u32 = 24;

/// Maps a key to an estimated position in a store.
pub trait Predictor<K: Key>: Send + Sync {
    /// Short name for reports.
    fn name(&self) -> &'static str;

    /// Estimated index of the first entry with `key`.
    fn predict(&self, key: K) -> usize;

    /// Largest distance between a prediction and the true run start over the
    /// keys the predictor was built from, if known.
    fn max_error(&self) -> Option<usize> {
        None
    }
}

#[inline]
fn clamp_position(pos: usize, len: usize) -> usize {
    pos.min(len.saturating_sub(1))
}

/// Run starts of every distinct key: `(key, first index)`.
fn run_starts<K: Key>(store: &SortedKv<K>) -> impl Iterator<Item = (K, usize)> + '_ {
    let data = store.as_slice();
    data.iter()
        .enumerate()
        .filter(move |&(i, e)| i == 0 || data[i - 1].key != e.key)
        .map(|(i, e)| (e.key, i))
}

fn measure_max_error<K: Key>(store: &SortedKv<K>, predict: impl Fn(K) -> usize) -> usize {
    run_starts(store)
        .map(|(key, start)| predict(key).abs_diff(start))
        .max()
        .unwrap_or(0)
}

// =============================================================================
// Linear model
// =============================================================================

/// Straight line through the first and last key.
///
/// The error bound is measured against the run start of every distinct key
/// when the model is trained.
#[derive(Debug, Clone)]
pub struct LinearModel {
    slope: f64,
    intercept: f64,
    len: usize,
    max_error: usize,
}

impl LinearModel {
    /// Fits the model to `store`.
    pub fn train<K: Key>(store: &SortedKv<K>) -> Self {
        let len = store.len();
        let (slope, intercept) = match (store.min_key(), store.max_key()) {
            (Some(lo), Some(hi)) if hi > lo => {
                let slope = (len - 1) as f64 / (hi.to_u64() - lo.to_u64()) as f64;
                (slope, -(lo.to_u64() as f64) * slope)
            }
            _ => (0.0, 0.0),
        };
        let mut model = Self {
            slope,
            intercept,
            len,
            max_error: 0,
        };
        let max_error = measure_max_error(store, |k| model.position(k.to_u64()));
        model.max_error = max_error;
        model
    }

    #[inline]
    fn position(&self, key: u64) -> usize {
        // `as` saturates: negative and NaN land on 0.
        let predicted = (self.slope * key as f64 + self.intercept) as usize;
        clamp_position(predicted, self.len)
    }
}

impl<K: Key> Predictor<K> for LinearModel {
    fn name(&self) -> &'static str {
        "linear"
    }

    #[inline]
    fn predict(&self, key: K) -> usize {
        self.position(key.to_u64())
    }

    fn max_error(&self) -> Option<usize> {
        Some(self.max_error)
    }
}

// =============================================================================
// Radix table
// =============================================================================

/// Hint table indexed by the key bits right after the prefix every key
/// shares. Each slot holds the first position whose bucket is at least that
/// slot.
#[derive(Debug, Clone)]
pub struct RadixTable {
    prefix_bits: u32,
    table_bits: u32,
    hints: Vec<usize>,
    len: usize,
    max_error: usize,
}

impl RadixTable {
    /// Builds a table with up to `bits` radix bits.
    ///
    /// `bits` is capped at [`MAX_RADIX_BITS`] and at the number of bits left
    /// after the common prefix.
    pub fn build<K: Key>(store: &SortedKv<K>, bits: u32) -> Self {
        let len = store.len();
        let prefix_bits = match (store.min_key(), store.max_key()) {
            (Some(lo), Some(hi)) => (lo.to_u64() ^ hi.to_u64()).leading_zeros(),
            _ => 0,
        };
        let table_bits = bits.min(MAX_RADIX_BITS).min(64 - prefix_bits);

        let mut table = Self {
            prefix_bits,
            table_bits,
            hints: vec![len; 1usize << table_bits],
            len,
            max_error: 0,
        };

        // Slots up to and including each entry's bucket that are not yet
        // claimed start at that entry.
        let mut next_slot = 0usize;
        for (i, e) in store.iter().enumerate() {
            let bucket = table.bucket(e.key.to_u64());
            while next_slot <= bucket {
                table.hints[next_slot] = i;
                next_slot += 1;
            }
        }

        let max_error = measure_max_error(store, |k| table.position(k.to_u64()));
        table.max_error = max_error;
        table
    }

    #[inline]
    fn bucket(&self, key: u64) -> usize {
        if self.table_bits == 0 {
            return 0;
        }
        // `table_bits > 0` implies `prefix_bits < 64`.
        ((key << self.prefix_bits) >> (64 - self.table_bits)) as usize
    }

    #[inline]
    fn position(&self, key: u64) -> usize {
        clamp_position(self.hints[self.bucket(key)], self.len)
    }

    /// Number of hint slots.
    pub fn slots(&self) -> usize {
        self.hints.len()
    }
}

impl<K: Key> Predictor<K> for RadixTable {
    fn name(&self) -> &'static str {
        "radix"
    }

    #[inline]
    fn predict(&self, key: K) -> usize {
        self.position(key.to_u64())
    }

    fn max_error(&self) -> Option<usize> {
        Some(self.max_error)
    }
}

// =============================================================================
// Noisy oracle
// =============================================================================

/// The true run start of a key, displaced by a pseudo-random offset in
/// `[-max_error, +max_error]` that depends only on the key and the seed.
///
/// Lets benchmarks dial in an exact error bound.
#[derive(Debug, Clone)]
pub struct NoisyOracle<'a, K> {
    store: &'a SortedKv<K>,
    max_error: usize,
    seed: u64,
}

impl<'a, K: Key> NoisyOracle<'a, K> {
    /// Oracle over `store` with displacements up to `max_error`.
    pub fn new(store: &'a SortedKv<K>, max_error: usize, seed: u64) -> Self {
        Self {
            store,
            max_error,
            seed,
        }
    }
}

impl<K: Key> Predictor<K> for NoisyOracle<'_, K> {
    fn name(&self) -> &'static str {
        "noisy"
    }

    fn predict(&self, key: K) -> usize {
        let truth = self.store.equal_range(key).start;
        if self.max_error == 0 {
            return clamp_position(truth, self.store.len());
        }
        let mut rng = StdRng::seed_from_u64(self.seed ^ key.to_u64());
        let offset = rng.gen_range(0..=self.max_error.saturating_mul(2));
        let displaced = truth.saturating_add(offset).saturating_sub(self.max_error);
        clamp_position(displaced, self.store.len())
    }

    fn max_error(&self) -> Option<usize> {
        Some(self.max_error)
    }
}

// =============================================================================
// Error profile
// =============================================================================

/// Distance between predictions and true run starts over every distinct key.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErrorProfile {
    /// Distinct keys measured
    pub keys: usize,
    /// Largest displacement
    pub max: usize,
    /// Mean displacement
    pub mean: f64,
}

/// Measures how far `predictor` lands from each distinct key's run.
pub fn error_profile<K: Key, P: Predictor<K> + ?Sized>(
    store: &SortedKv<K>,
    predictor: &P,
) -> ErrorProfile {
    let mut keys = 0usize;
    let mut max = 0usize;
    let mut total = 0u128;
    for (key, start) in run_starts(store) {
        let err = predictor.predict(key).abs_diff(start);
        keys += 1;
        max = max.max(err);
        total += err as u128;
    }
    ErrorProfile {
        keys,
        max,
        mean: if keys == 0 {
            0.0
        } else {
            total as f64 / keys as f64
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learned_search::{exponential, QueryResult};

    fn uniform_store(n: u64, stride: u64) -> SortedKv<u64> {
        SortedKv::from_keys((0..n).map(|k| k * stride).collect())
    }

    #[test]
    fn test_linear_model_exact_on_uniform_keys() {
        // A power-of-two stride keeps the slope exact in floating point.
        let store = uniform_store(1000, 8);
        let model = LinearModel::train(&store);
        assert_eq!(Predictor::<u64>::max_error(&model), Some(0));
        for (i, e) in store.iter().enumerate() {
            assert_eq!(model.predict(e.key), i);
        }
        // Keys outside the trained domain clamp to the ends.
        assert_eq!(model.predict(u64::MAX), store.len() - 1);
    }

    #[test]
    fn test_linear_model_degenerate_stores() {
        let empty = SortedKv::<u32>::from_keys(Vec::new());
        assert_eq!(LinearModel::train(&empty).predict(5u32), 0);

        let single_run = SortedKv::from_keys(vec![9u32; 5]);
        let model = LinearModel::train(&single_run);
        assert_eq!(model.predict(9u32), 0);
        assert_eq!(model.predict(100u32), 0);
    }

    #[test]
    fn test_linear_model_error_bound_holds() {
        let keys: Vec<u64> = (0..500u64).map(|k| k * k).collect();
        let store = SortedKv::from_keys(keys);
        let model = LinearModel::train(&store);
        let bound = Predictor::<u64>::max_error(&model).unwrap();
        let profile = error_profile(&store, &model);
        assert_eq!(profile.max, bound);
        assert!(bound > 0);
    }

    #[test]
    fn test_radix_table_points_at_bucket_start() {
        let store = uniform_store(4096, 1 << 20);
        let table = RadixTable::build(&store, 8);
        assert_eq!(table.slots(), 256);
        for (i, e) in store.iter().enumerate() {
            let p: usize = table.predict(e.key);
            assert!(p <= i, "hint must not overshoot the bucket start");
            assert_eq!(store.as_slice()[p].key >> 20 >> 4, e.key >> 20 >> 4);
        }
        let profile = error_profile(&store, &table);
        assert_eq!(Some(profile.max), Predictor::<u64>::max_error(&table));
        assert_eq!(profile.max, 15);
    }

    #[test]
    fn test_radix_table_degenerate_stores() {
        let same = SortedKv::from_keys(vec![42u64; 3]);
        let table = RadixTable::build(&same, 16);
        assert_eq!(table.slots(), 1);
        assert_eq!(table.predict(42u64), 0);

        let empty = SortedKv::<u64>::from_keys(Vec::new());
        let table = RadixTable::build(&empty, 4);
        assert_eq!(table.predict(1u64), 0);
    }

    #[test]
    fn test_noisy_oracle_respects_bound() {
        let store = uniform_store(10_000, 3);
        for bound in [0usize, 1, 16, 4096] {
            let oracle = NoisyOracle::new(&store, bound, 9);
            let profile = error_profile(&store, &oracle);
            assert!(profile.max <= bound, "bound {bound}: {profile:?}");
            for (i, e) in store.iter().enumerate().step_by(97) {
                let p = oracle.predict(e.key);
                assert!(p < store.len());
                assert_eq!(p, oracle.predict(e.key), "predictions are deterministic");
                assert_eq!(
                    exponential::search(store.as_slice(), e.key, p),
                    QueryResult::new(i as u64, 1)
                );
            }
        }
    }
}
