//! Basic usage of the search kernels and the harness around them.

use learned_search::{Entry, SearchKind, SortedKv};
use learned_search_harness::predictor::{error_profile, LinearModel, Predictor, RadixTable};
use learned_search_harness::{runner, workload, Config};

fn main() {
    example_kernels();
    example_predictors();
    example_runner();
}

fn example_kernels() {
    println!("=== Kernels ===\n");

    let store = SortedKv::from_sorted(vec![
        Entry::new(1u32, 10),
        Entry::new(3, 5),
        Entry::new(3, 7),
        Entry::new(3, 1),
        Entry::new(8, 2),
    ])
    .unwrap();

    // Every strategy agrees; only the work done differs.
    for kind in SearchKind::ALL {
        println!("{kind:<12} key 3 from 0 = {}", store.search(kind, 3, Some(0)).unwrap());
    }
    println!("exact  key 4         = {}", store.exact(4, None).unwrap());
    println!("linear key 8 from 9  = {:?}\n", store.linear(8, 9));
}

fn example_predictors() {
    println!("=== Predictors ===\n");

    let keys: Vec<u64> = (0..100_000u64).map(|k| k * k / 7).collect();
    let store = SortedKv::from_keys(keys);

    let model = LinearModel::train(&store);
    let table = RadixTable::build(&store, 12);
    for predictor in [&model as &dyn Predictor<u64>, &table] {
        let profile = error_profile(&store, predictor);
        println!(
            "{:<7} max error {:>6}  mean error {:>9.1}",
            predictor.name(),
            profile.max,
            profile.mean
        );
    }
    println!();
}

fn example_runner() {
    println!("=== Runner ===\n");

    let keys: Vec<u64> = (0..200_000u64).map(|k| k / 4 * 13).collect();
    let store = SortedKv::from_keys(keys);
    let config = Config {
        num_lookups: 100_000,
        absent_ratio: 0.1,
        threads: 2,
        ..Config::default()
    };
    let lookups = workload::lookups_for(&config, &store);
    let table = RadixTable::build(&store, 16);

    for report in runner::run_all(&config, &store, &lookups, &table).unwrap() {
        println!("{report}");
    }
}
