//! Synthetic keys and equality lookups.

use learned_search::{exact, Key, QueryResult, SortedKv};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;

/// Attempts at drawing a key that is not in the store before settling for a
/// present one. Only dense key domains ever exhaust this.
const ABSENT_KEY_TRIES: usize = 64;

/// An equality lookup and the answer exact search gives for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lookup<K> {
    /// Key to look up
    pub key: K,
    /// Sum and count over the key's run
    pub expected: QueryResult,
}

/// `n` sorted random keys spread over the whole key domain.
///
/// With `dup_factor > 1` every distinct key is repeated that many times (the
/// last run may be shorter), producing runs for duplicate aggregation.
pub fn generate_keys<K: Key>(n: usize, dup_factor: usize, rng: &mut impl Rng) -> Vec<K> {
    let dup = dup_factor.max(1);
    let distinct = n.div_ceil(dup);
    let mut keys: Vec<K> = Vec::with_capacity(n);
    for _ in 0..distinct {
        let k = K::from_u64_truncating(rng.gen::<u64>());
        for _ in 0..dup {
            keys.push(k);
        }
    }
    keys.truncate(n);
    keys.sort_unstable();
    keys
}

/// `n` lookups against `store`, a fraction `absent_ratio` of them for keys the
/// store does not contain.
pub fn generate_lookups<K: Key>(
    store: &SortedKv<K>,
    n: usize,
    absent_ratio: f64,
    rng: &mut impl Rng,
) -> Vec<Lookup<K>> {
    let absent_ratio = if absent_ratio.is_nan() {
        0.0
    } else {
        absent_ratio.clamp(0.0, 1.0)
    };
    (0..n)
        .map(|_| {
            let key = if store.is_empty() || rng.gen_bool(absent_ratio) {
                absent_key(store, rng)
            } else {
                store.as_slice()[rng.gen_range(0..store.len())].key
            };
            Lookup {
                key,
                expected: exact::search(store.as_slice(), key, None),
            }
        })
        .collect()
}

/// Lookups described by `config`, seeded from `config.seed`.
pub fn lookups_for<K: Key>(config: &Config, store: &SortedKv<K>) -> Vec<Lookup<K>> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    generate_lookups(
        store,
        config.num_lookups,
        config.clamped_absent_ratio(),
        &mut rng,
    )
}

fn absent_key<K: Key>(store: &SortedKv<K>, rng: &mut impl Rng) -> K {
    let mut key = K::from_u64_truncating(rng.gen::<u64>());
    for _ in 0..ABSENT_KEY_TRIES {
        if store.equal_range(key).is_empty() {
            break;
        }
        key = K::from_u64_truncating(rng.gen::<u64>());
    }
    key
}
