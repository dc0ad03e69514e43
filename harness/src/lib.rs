//! # learned-search-harness
//!
//! Everything around the search kernels that a benchmark needs but the
//! kernels themselves must not depend on:
//!
//! - **Datasets**: SOSD-style binary files (a `u64` element count followed by
//!   raw little-endian records), memory-mapped on load.
//! - **Workloads**: random keys and equality lookups with precomputed answers.
//! - **Predictors**: sources of position estimates, from a two-point linear
//!   model to a radix hint table to a noisy oracle with a chosen error.
//! - **Runner**: timed, optionally pinned and multi-threaded lookup loops
//!   that verify every result.
//!
//! ## Example
//!
//! ```rust
//! use learned_search::{SearchKind, SortedKv};
//! use learned_search_harness::predictor::LinearModel;
//! use learned_search_harness::{runner, workload, Config};
//!
//! let store = SortedKv::from_keys((0..1000u64).map(|k| k * 3).collect());
//! let config = Config {
//!     kind: SearchKind::Exponential,
//!     num_lookups: 500,
//!     ..Config::default()
//! };
//! let lookups = workload::lookups_for(&config, &store);
//! let model = LinearModel::train(&store);
//!
//! let report = runner::run(&config, &store, &lookups, &model).unwrap();
//! assert_eq!(report.lookups, 500);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dataset;
mod error;
pub mod platform;
pub mod predictor;
pub mod runner;
pub mod workload;

pub use config::Config;
pub use error::{HarnessError, Result};
