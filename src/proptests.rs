use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Reference aggregate computed without any of the kernels.
fn model_sum(entries: &[Entry<u32>], key: u32) -> QueryResult {
    let mut m: BTreeMap<u32, QueryResult> = BTreeMap::new();
    for e in entries {
        let r = m.entry(e.key).or_default();
        r.sum = r.sum.wrapping_add(e.value);
        r.count += 1;
    }
    m.get(&key).copied().unwrap_or(QueryResult::ABSENT)
}

fn validate_store<K: Key>(kv: &SortedKv<K>) {
    for w in kv.as_slice().windows(2) {
        assert!(w[0].key <= w[1].key, "store must stay sorted");
    }
}

fn entries_strategy() -> impl Strategy<Value = Vec<Entry<u32>>> {
    // A narrow key domain forces long runs and plenty of absent keys in between.
    prop::collection::vec((0u32..64, any::<u64>()), 1..=300)
        .prop_map(|pairs| pairs.into_iter().map(Entry::from).collect())
}

fn store_and_probe() -> impl Strategy<Value = (SortedKv<u32>, u32, usize)> {
    entries_strategy().prop_flat_map(|entries| {
        let kv = SortedKv::from_unsorted(entries);
        let len = kv.len();
        (Just(kv), 0u32..70, 0..len)
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_strategies_agree((kv, key, estimate) in store_and_probe()) {
        validate_store(&kv);
        let expected = model_sum(kv.as_slice(), key);

        prop_assert_eq!(exact::search(kv.as_slice(), key, None), expected);
        prop_assert_eq!(linear::search(kv.as_slice(), key, estimate), expected);
        prop_assert_eq!(exponential::search(kv.as_slice(), key, estimate), expected);
    }

    #[test]
    fn prop_every_estimate_agrees((kv, key, _estimate) in store_and_probe()) {
        let expected = exact::search(kv.as_slice(), key, None);
        for e in 0..kv.len() {
            prop_assert_eq!(linear::search(kv.as_slice(), key, e), expected);
            prop_assert_eq!(exponential::search(kv.as_slice(), key, e), expected);
        }
    }

    #[test]
    fn prop_run_estimate_counts_whole_run((kv, _key, estimate) in store_and_probe()) {
        // Aim the estimate at an arbitrary slot inside a run and query that run.
        let key = kv.as_slice()[estimate].key;
        let run = kv.equal_range(key);
        prop_assert!(run.contains(&estimate));

        let expected = QueryResult::new(
            kv.as_slice()[run.clone()].iter().fold(0u64, |s, e| s.wrapping_add(e.value)),
            run.len(),
        );
        for kind in SearchKind::ALL {
            prop_assert_eq!(kv.search(kind, key, Some(estimate)), Ok(expected));
        }
    }

    #[test]
    fn prop_checked_dispatch(
        (kv, key, estimate) in store_and_probe(),
        kind in any::<SearchKind>(),
        overshoot in 0usize..4,
    ) {
        let expected = model_sum(kv.as_slice(), key);
        prop_assert_eq!(kv.search(kind, key, Some(estimate)), Ok(expected));
        prop_assert_eq!(kv.search(kind, key, None), Ok(expected));

        let bad = kv.len() + overshoot;
        prop_assert_eq!(
            kv.search(kind, key, Some(bad)),
            Err(SearchError::EstimateOutOfRange { estimate: bad, len: kv.len() })
        );
    }

    #[test]
    fn prop_exact_subrange_containing_run_start(
        (kv, key, _estimate) in store_and_probe(),
        pad_lo in 0usize..8,
        pad_hi in 0usize..8,
    ) {
        let run = kv.equal_range(key);
        let start = run.start.saturating_sub(pad_lo);
        let end = (run.start + 1 + pad_hi).min(kv.len());
        let expected = model_sum(kv.as_slice(), key);
        prop_assert_eq!(kv.exact(key, Some(start..end)), Ok(expected));
    }
}

/// Every layout of up to six entries over three keys, every key (present or
/// not) and every estimate.
#[test]
fn exhaustive_small_layouts() {
    fn rec(prefix: &mut Vec<u32>, max_len: usize, f: &mut impl FnMut(&[u32])) {
        if !prefix.is_empty() {
            f(prefix);
        }
        if prefix.len() == max_len {
            return;
        }
        let lo = prefix.last().map_or(0, |k| (k - 1) / 2);
        for k in lo..3 {
            prefix.push(k * 2 + 1);
            rec(prefix, max_len, f);
            prefix.pop();
        }
    }

    let mut layouts = 0usize;
    rec(&mut Vec::new(), 6, &mut |keys: &[u32]| {
        layouts += 1;
        let entries: Vec<Entry<u32>> = keys
            .iter()
            .enumerate()
            .map(|(i, &k)| Entry::new(k, 1 << i))
            .collect();
        let kv = SortedKv::from_sorted(entries).unwrap();
        for key in 0..8u32 {
            let expected = model_sum(kv.as_slice(), key);
            for e in 0..kv.len() {
                for kind in SearchKind::ALL {
                    assert_eq!(
                        kind.run(kv.as_slice(), key, e),
                        expected,
                        "{kind} keys {keys:?} key {key} estimate {e}"
                    );
                }
            }
        }
    });
    assert!(layouts > 50);
}
