//! Timed lookup loops.
//!
//! A run splits the lookups into one contiguous partition per worker. Each
//! worker optionally pins itself, computes every estimate up front, then
//! times the search loop alone so predictor cost and correction cost are
//! reported separately. Workers share the store read-only.

use std::fmt;
use std::thread;
use std::time::Duration;

use learned_search::{Key, QueryResult, SearchError, SearchKind, SortedKv};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{HarnessError, Result};
use crate::platform;
use crate::predictor::Predictor;
use crate::workload::Lookup;

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Strategy that ran
    pub kind: SearchKind,
    /// Name of the predictor that supplied estimates
    pub predictor: &'static str,
    /// Lookups performed
    pub lookups: usize,
    /// Lookups whose key was present
    pub found: usize,
    /// Wrapping sum of every lookup's sum, so the work cannot be optimised out
    pub checksum: u64,
    /// Slowest worker's time spent predicting
    pub predict_elapsed: Duration,
    /// Slowest worker's time spent searching
    pub search_elapsed: Duration,
    /// Workers used
    pub threads: usize,
}

impl RunReport {
    /// Search time per lookup, per worker.
    pub fn ns_per_lookup(&self) -> f64 {
        if self.lookups == 0 {
            return 0.0;
        }
        let per_worker = self.lookups as f64 / self.threads.max(1) as f64;
        self.search_elapsed.as_nanos() as f64 / per_worker
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12} {:<7} {:>10} lookups {:>10} found {:>8.1} ns/lookup  predict {:>8.1} ms  checksum {:#018x}",
            self.kind.name(),
            self.predictor,
            self.lookups,
            self.found,
            self.ns_per_lookup(),
            self.predict_elapsed.as_secs_f64() * 1e3,
            self.checksum,
        )
    }
}

/// One worker's share of a run.
#[derive(Debug, Default)]
struct Partial {
    lookups: usize,
    found: usize,
    checksum: u64,
    predict_elapsed: Duration,
    search_elapsed: Duration,
}

/// Runs every lookup through `config.kind`, with estimates from `predictor`.
///
/// Fails if the store is empty while the strategy needs an estimate, if a
/// worker cannot be pinned, or (with `config.verify`) on the first result
/// that differs from the lookup's expected answer.
pub fn run<K: Key, P: Predictor<K> + ?Sized>(
    config: &Config,
    store: &SortedKv<K>,
    lookups: &[Lookup<K>],
    predictor: &P,
) -> Result<RunReport> {
    if store.is_empty() && config.kind.uses_estimate() && !lookups.is_empty() {
        return Err(SearchError::EmptyStore.into());
    }

    let threads = config.worker_threads().min(lookups.len()).max(1);
    let chunk = lookups.len().div_ceil(threads).max(1);
    let partials: Mutex<Vec<Result<Partial>>> = Mutex::new(Vec::with_capacity(threads));

    thread::scope(|s| {
        for (worker, part) in lookups.chunks(chunk).enumerate() {
            let partials = &partials;
            s.spawn(move || {
                let result = run_partition(config, store, part, predictor, worker);
                partials.lock().push(result);
            });
        }
    });

    let mut total = Partial::default();
    let mut workers = 0usize;
    for partial in partials.into_inner() {
        let partial = partial?;
        workers += 1;
        total.lookups += partial.lookups;
        total.found += partial.found;
        total.checksum = total.checksum.wrapping_add(partial.checksum);
        total.predict_elapsed = total.predict_elapsed.max(partial.predict_elapsed);
        total.search_elapsed = total.search_elapsed.max(partial.search_elapsed);
    }

    let report = RunReport {
        kind: config.kind,
        predictor: predictor.name(),
        lookups: total.lookups,
        found: total.found,
        checksum: total.checksum,
        predict_elapsed: total.predict_elapsed,
        search_elapsed: total.search_elapsed,
        threads: workers.max(1),
    };
    debug!(
        target: "learned_search::harness",
        kind = %report.kind,
        predictor = report.predictor,
        lookups = report.lookups,
        threads = report.threads,
        "run finished"
    );
    Ok(report)
}

/// Runs every strategy in [`SearchKind::ALL`] over the same lookups, in
/// order. `config.kind` is ignored.
pub fn run_all<K: Key, P: Predictor<K> + ?Sized>(
    config: &Config,
    store: &SortedKv<K>,
    lookups: &[Lookup<K>],
    predictor: &P,
) -> Result<Vec<RunReport>> {
    SearchKind::ALL
        .iter()
        .map(|&kind| run(&config.with_kind(kind), store, lookups, predictor))
        .collect()
}

fn run_partition<K: Key, P: Predictor<K> + ?Sized>(
    config: &Config,
    store: &SortedKv<K>,
    lookups: &[Lookup<K>],
    predictor: &P,
    worker: usize,
) -> Result<Partial> {
    if let Some(base) = config.pin_core {
        platform::pin_current_thread(base.wrapping_add(worker as u32))?;
    }

    let len = store.len();
    let (estimates, predict_elapsed) = platform::time(|| {
        if config.kind.uses_estimate() {
            lookups.iter().map(|l| predictor.predict(l.key)).collect()
        } else {
            vec![0usize; lookups.len()]
        }
    });
    if config.kind.uses_estimate() {
        if let Some(&estimate) = estimates.iter().find(|&&e| e >= len) {
            return Err(SearchError::EstimateOutOfRange { estimate, len }.into());
        }
    }

    let data = store.as_slice();
    let kind = config.kind;
    let ((found, checksum, results), search_elapsed) = platform::time(|| {
        let mut found = 0usize;
        let mut checksum = 0u64;
        let mut results = Vec::with_capacity(if config.verify { lookups.len() } else { 0 });
        for (l, &estimate) in lookups.iter().zip(&estimates) {
            let r = kind.run(data, l.key, estimate);
            found += r.is_found() as usize;
            checksum = checksum.wrapping_add(r.sum);
            if config.verify {
                results.push(r);
            }
        }
        (found, checksum, results)
    });

    if config.verify {
        verify(kind, lookups, &results)?;
    }

    Ok(Partial {
        lookups: lookups.len(),
        found,
        checksum,
        predict_elapsed,
        search_elapsed,
    })
}

fn verify<K: Key>(kind: SearchKind, lookups: &[Lookup<K>], results: &[QueryResult]) -> Result<()> {
    match lookups
        .iter()
        .zip(results)
        .find(|(l, r)| l.expected != **r)
    {
        Some((l, &actual)) => {
            warn!(
                target: "learned_search::harness",
                %kind,
                key = %l.key,
                expected = %l.expected,
                actual = %actual,
                "incorrect lookup result"
            );
            Err(HarnessError::ResultMismatch {
                key: l.key.to_u64(),
                expected: l.expected,
                actual,
            })
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{LinearModel, NoisyOracle};
    use crate::workload::{generate_keys, generate_lookups, lookups_for};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Always predicts the same position.
    struct Fixed(usize);

    impl<K: Key> Predictor<K> for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn predict(&self, _key: K) -> usize {
            self.0
        }
    }

    fn dup_store(n: usize, seed: u64) -> SortedKv<u64> {
        let mut rng = StdRng::seed_from_u64(seed);
        SortedKv::from_keys(generate_keys(n, 3, &mut rng))
    }

    #[test]
    fn test_all_kinds_agree_on_checksum() {
        let store = dup_store(5000, 1);
        let config = Config {
            num_lookups: 2000,
            absent_ratio: 0.25,
            ..Config::default()
        };
        let lookups = lookups_for(&config, &store);
        let oracle = NoisyOracle::new(&store, 64, 7);

        let reports = run_all(&config, &store, &lookups, &oracle).unwrap();
        assert_eq!(reports.len(), 3);
        let expected: u64 = lookups
            .iter()
            .fold(0u64, |acc, l| acc.wrapping_add(l.expected.sum));
        let present = lookups.iter().filter(|l| l.expected.is_found()).count();
        for (report, kind) in reports.iter().zip(SearchKind::ALL) {
            assert_eq!(report.kind, kind);
            assert_eq!(report.predictor, "noisy");
            assert_eq!(report.lookups, 2000);
            assert_eq!(report.found, present);
            assert_eq!(report.checksum, expected);
        }
    }

    #[test]
    fn test_worst_estimates_still_correct() {
        let store = dup_store(3000, 2);
        let config = Config {
            num_lookups: 300,
            ..Config::default()
        };
        let lookups = lookups_for(&config, &store);
        for fixed in [Fixed(0), Fixed(store.len() - 1), Fixed(store.len() / 2)] {
            for kind in [SearchKind::Linear, SearchKind::Exponential] {
                let report = run(&config.with_kind(kind), &store, &lookups, &fixed).unwrap();
                assert_eq!(report.found, 300);
            }
        }
    }

    #[test]
    fn test_multi_threaded_matches_single() {
        let store = dup_store(10_000, 3);
        let config = Config {
            num_lookups: 4001,
            absent_ratio: 0.1,
            ..Config::default()
        };
        let lookups = lookups_for(&config, &store);
        let model = LinearModel::train(&store);

        let single = run(&config, &store, &lookups, &model).unwrap();
        let multi = run(
            &Config {
                threads: 4,
                ..config.clone()
            },
            &store,
            &lookups,
            &model,
        )
        .unwrap();
        assert_eq!(multi.threads, 4);
        assert_eq!(multi.lookups, single.lookups);
        assert_eq!(multi.found, single.found);
        assert_eq!(multi.checksum, single.checksum);
    }

    #[test]
    fn test_more_threads_than_lookups() {
        let store = dup_store(100, 4);
        let config = Config {
            num_lookups: 3,
            threads: 16,
            ..Config::default()
        };
        let lookups = lookups_for(&config, &store);
        let report = run(&config, &store, &lookups, &Fixed(0)).unwrap();
        assert_eq!(report.threads, 3);
        assert_eq!(report.lookups, 3);
    }

    #[test]
    fn test_mismatch_is_reported() {
        let store = SortedKv::from_keys(vec![1u32, 2, 2, 5]);
        let mut lookups = generate_lookups(&store, 10, 0.0, &mut StdRng::seed_from_u64(5));
        lookups[4].expected = QueryResult::new(999, 9);
        let key = lookups[4].key;

        let err = run(&Config::default(), &store, &lookups, &Fixed(1)).unwrap_err();
        match err {
            HarnessError::ResultMismatch { key: k, expected, .. } => {
                assert_eq!(k, key as u64);
                assert_eq!(expected, QueryResult::new(999, 9));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let unchecked = Config {
            verify: false,
            ..Config::default()
        };
        assert!(run(&unchecked, &store, &lookups, &Fixed(1)).is_ok());
    }

    #[test]
    fn test_empty_store_and_bad_predictor() {
        let empty = SortedKv::<u64>::from_keys(Vec::new());
        let lookups = generate_lookups(&empty, 5, 0.0, &mut StdRng::seed_from_u64(6));

        let err = run(&Config::default(), &empty, &lookups, &Fixed(0)).unwrap_err();
        assert!(matches!(err, HarnessError::Search(SearchError::EmptyStore)));

        // Binary search never reads the estimate.
        let binary = Config::default().with_kind(SearchKind::Binary);
        let report = run(&binary, &empty, &lookups, &Fixed(0)).unwrap();
        assert_eq!(report.found, 0);

        let store = SortedKv::from_keys(vec![1u64, 2, 3]);
        let lookups = generate_lookups(&store, 5, 0.0, &mut StdRng::seed_from_u64(7));
        let err = run(&Config::default(), &store, &lookups, &Fixed(3)).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Search(SearchError::EstimateOutOfRange { estimate: 3, len: 3 })
        ));
    }

    #[test]
    fn test_report_display() {
        let report = RunReport {
            kind: SearchKind::Linear,
            predictor: "radix",
            lookups: 1000,
            found: 900,
            checksum: 0xabc,
            predict_elapsed: Duration::from_millis(2),
            search_elapsed: Duration::from_micros(50),
            threads: 1,
        };
        assert_eq!(report.ns_per_lookup(), 50.0);
        let line = report.to_string();
        assert!(line.starts_with("linear"));
        assert!(line.contains("radix"));
        assert!(line.contains("0x0000000000000abc"));
    }
}
