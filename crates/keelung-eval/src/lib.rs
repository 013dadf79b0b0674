#![doc(issue_tracker_base_url = "https://github.com/factordynamics/keelung/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Portfolio aggregation and batch evaluation for Keelung.
//!
//! [`portfolio_returns`] turns one holding matrix into a daily equal-weight
//! return series; [`run_batch`] does it for a whole rule set at once with
//! per-factor failure isolation; [`metrics`] summarizes the resulting
//! series.

/// The version of the keelung-eval crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod batch;
pub mod metrics;
pub mod portfolio;

// Re-exports
pub use batch::{run_batch, BatchConfig, BatchOutput, FactorArtifact};
pub use metrics::SeriesSummary;
pub use portfolio::{portfolio_returns, EmptyPolicy, ReturnSeries};
