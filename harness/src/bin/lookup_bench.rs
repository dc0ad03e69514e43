//! lookup-bench: generate SOSD-style datasets and time the search kernels
//! over them.
//!
//! ```text
//! lookup-bench generate --out data/uniform_10M_uint64 --count 10000000 --dup 4
//! lookup-bench run --data data/uniform_10M_uint64 --predictor radix --threads 4
//! ```
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use learned_search::{Key, SearchKind, SortedKv};
use learned_search_harness::config::DEFAULT_SEED;
use learned_search_harness::dataset::{self, DataType};
use learned_search_harness::predictor::{
    error_profile, LinearModel, NoisyOracle, Predictor, RadixTable,
};
use learned_search_harness::{runner, workload, Config, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// Benchmark learned-index position correction
#[derive(Parser, Debug)]
#[command(name = "lookup-bench")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a sorted random dataset
    Generate(GenerateArgs),

    /// Time lookups against a dataset
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Output file; the key width comes from its `_uint32` / `_uint64` suffix
    #[arg(long)]
    out: PathBuf,

    /// Number of keys
    #[arg(long, default_value_t = 1_000_000)]
    count: usize,

    /// Copies of each distinct key
    #[arg(long, default_value_t = 1)]
    dup: usize,

    /// Write `(key, value)` pairs instead of bare keys
    #[arg(long)]
    entries: bool,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Dataset file
    #[arg(long)]
    data: PathBuf,

    /// The file holds `(key, value)` pairs rather than bare keys
    #[arg(long)]
    entries: bool,

    /// Drop duplicate keys before searching
    #[arg(long)]
    unique: bool,

    /// Strategies to run, comma separated
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "binary,linear,exponential"
    )]
    kinds: Vec<SearchKind>,

    /// Source of position estimates
    #[arg(long, value_enum, default_value_t = PredictorArg::Radix)]
    predictor: PredictorArg,

    /// Radix bits for the radix predictor
    #[arg(long, default_value_t = 16)]
    radix_bits: u32,

    /// Largest displacement for the noisy predictor
    #[arg(long, default_value_t = 32)]
    noise: usize,

    /// Number of lookups
    #[arg(long, default_value_t = 10_000_000)]
    lookups: usize,

    /// Fraction of lookups for absent keys
    #[arg(long, default_value_t = 0.0)]
    absent: f64,

    /// Worker threads
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Pin worker `i` to core `pin + i`
    #[arg(long)]
    pin: Option<u32>,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Skip checking results against exact search
    #[arg(long)]
    no_verify: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PredictorArg {
    Linear,
    Radix,
    Noisy,
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    match Cli::parse().command {
        Command::Generate(args) => match DataType::from_path(&args.out)? {
            DataType::U32 => generate::<u32>(&args),
            DataType::U64 => generate::<u64>(&args),
        },
        Command::Run(args) => match DataType::from_path(&args.data)? {
            DataType::U32 => bench::<u32>(&args),
            DataType::U64 => bench::<u64>(&args),
        },
    }
}

fn generate<K: Key>(args: &GenerateArgs) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let keys: Vec<K> = workload::generate_keys(args.count, args.dup, &mut rng);
    if args.entries {
        dataset::write_entries(&dataset::add_values(&keys), &args.out)
    } else {
        dataset::write_keys(&keys, &args.out)
    }
}

fn load<K: Key>(path: &Path, entries: bool) -> Result<SortedKv<K>> {
    if entries {
        Ok(SortedKv::from_unsorted(dataset::load_entries(path)?))
    } else {
        dataset::load_store(path)
    }
}

fn bench<K: Key>(args: &RunArgs) -> Result<()> {
    let mut store = load::<K>(&args.data, args.entries)?;
    if args.unique {
        store = store.dedup_keys();
    }
    info!(
        len = store.len(),
        unique = store.is_unique(),
        "loaded store"
    );

    let config = Config {
        kind: SearchKind::Exponential,
        num_lookups: args.lookups,
        absent_ratio: args.absent,
        threads: args.threads,
        pin_core: args.pin,
        seed: args.seed,
        verify: !args.no_verify,
    };
    let lookups = workload::lookups_for(&config, &store);

    let predictor: Box<dyn Predictor<K> + '_> = match args.predictor {
        PredictorArg::Linear => Box::new(LinearModel::train(&store)),
        PredictorArg::Radix => {
            let table = RadixTable::build(&store, args.radix_bits);
            info!(slots = table.slots(), "built radix table");
            Box::new(table)
        }
        PredictorArg::Noisy => Box::new(NoisyOracle::new(&store, args.noise, args.seed)),
    };
    let profile = error_profile(&store, &*predictor);
    info!(
        predictor = predictor.name(),
        max_error = profile.max,
        mean_error = format_args!("{:.1}", profile.mean),
        "estimate error"
    );

    for &kind in &args.kinds {
        let report = runner::run(&config.with_kind(kind), &store, &lookups, &*predictor)?;
        println!("{report}");
    }
    Ok(())
}
