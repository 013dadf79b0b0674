#![doc(issue_tracker_base_url = "https://github.com/factordynamics/keelung/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Point-in-time factor decision rules for Keelung.
//!
//! Each factor is a [`HoldingRule`]: a pure function from an immutable
//! [`PanelSet`] (returns, prices, fundamental panels, eligibility pool) to a
//! daily 0/1 holding matrix. The rules encode their own decision lags (last
//! month's ratios for value, a two-month publication delay for YoY growth,
//! quarter-shifted verdicts for margin factors), so no output ever depends
//! on information unavailable at the decision cutoff.
//!
//! The standard set covers thirteen factors across seven categories; see
//! [`registry`] for metadata and construction.

/// The version of the keelung-signals crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod dividend_yield;
pub mod eps;
pub mod growth;
pub mod margin;
pub mod momentum;
pub mod quantrend;
pub mod registry;
pub mod rule;
pub mod select;
pub mod surprise;
pub mod universe;
pub mod value;

// Re-exports
pub use registry::{
    factor_metadata, factors_by_category, registered_factors, standard_rules, FactorCategory,
    FactorMetadata,
};
pub use rule::{panel_keys, HoldingRule, PanelSet, Rebalance};
pub use universe::{build_pool, Pool};
