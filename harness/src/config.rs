//! Workload configuration.

use learned_search::SearchKind;

/// Seed of the xorshift generator in the SOSD benchmark, kept so that default
/// workloads are reproducible run to run.
pub const DEFAULT_SEED: u64 = 2_305_843_008_139_952_128;

/// Configuration for one benchmark run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Strategy used to correct estimates
    pub kind: SearchKind,
    /// Number of lookups to generate
    pub num_lookups: usize,
    /// Fraction of lookups for keys not in the store (0.0..=1.0)
    pub absent_ratio: f64,
    /// Worker threads sharing the store
    pub threads: usize,
    /// Pin worker `i` to core `pin_core + i`
    pub pin_core: Option<u32>,
    /// Seed for key and lookup generation
    pub seed: u64,
    /// Compare every result against the precomputed answer
    pub verify: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kind: SearchKind::Exponential,
            num_lookups: 10_000,
            absent_ratio: 0.0,
            threads: 1,
            pin_core: None,
            seed: DEFAULT_SEED,
            verify: true,
        }
    }
}

impl Config {
    /// Same configuration with a different search strategy.
    pub fn with_kind(&self, kind: SearchKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }

    /// Thread count, never zero.
    pub fn worker_threads(&self) -> usize {
        self.threads.max(1)
    }

    /// Absent-key ratio clamped into `0.0..=1.0`. NaN counts as zero.
    pub fn clamped_absent_ratio(&self) -> f64 {
        if self.absent_ratio.is_nan() {
            0.0
        } else {
            self.absent_ratio.clamp(0.0, 1.0)
        }
    }
}
