#![doc(issue_tracker_base_url = "https://github.com/factordynamics/keelung/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # keelung
//!
//! Point-in-time factor signal engine.
//!
//! keelung derives historical investment factor signals from heterogeneous
//! time-series panels (daily returns, monthly fundamental ratios,
//! quarterly statements) and converts each signal into a daily
//! equal-weight portfolio return series, under strict no-lookahead
//! discipline.
//!
//! ## Pipeline
//!
//! 1. [`panel`] ingests raw data into calendar-indexed panels.
//! 2. [`signals::build_pool`] ranks market capitalization into the
//!    point-in-time eligible universe.
//! 3. Each [`signals::HoldingRule`] turns panels plus pool into a daily
//!    0/1 holding matrix, encoding its own decision lag.
//! 4. [`eval::run_batch`] aggregates holdings into portfolio returns with
//!    per-factor failure isolation.
//!
//! ## Quick start
//!
//! ```ignore
//! use keelung::prelude::*;
//! use std::collections::BTreeSet;
//!
//! let pool = build_pool(&market_cap, 200, &BTreeSet::new());
//! let inputs = PanelSet::new(returns, pool)
//!     .with_prices(prices)
//!     .with_monthly(panel_keys::PE_RATIO, pe_ratio);
//!
//! let output = run_batch(&inputs, &standard_rules(), &BatchConfig::default());
//! for (name, artifact) in &output.factors {
//!     println!("{name}: {:.2}%", artifact.daily_returns.total_return() * 100.0);
//! }
//! ```

/// Version information for the keelung crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Foundational types: errors, periods, cross-sectional statistics.
pub mod traits {
    pub use keelung_traits::*;
}

/// Calendar and panel containers.
pub mod panel {
    pub use keelung_panel::*;
}

/// Factor decision rules, registry and universe construction.
pub mod signals {
    pub use keelung_signals::*;
}

/// Portfolio aggregation and batch evaluation.
pub mod eval {
    pub use keelung_eval::*;
}

// Re-export the working vocabulary at the crate root.
pub use keelung_eval::{
    run_batch, BatchConfig, BatchOutput, EmptyPolicy, FactorArtifact, ReturnSeries, SeriesSummary,
};
pub use keelung_panel::{DailyPanel, HoldingMatrix, MonthlyPanel, QuarterlyPanel, TradingCalendar};
pub use keelung_signals::{
    build_pool, panel_keys, standard_rules, HoldingRule, PanelSet, Pool, Rebalance,
};
pub use keelung_traits::{Date, KeelungError, Month, Quarter, Result, Symbol};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use keelung_eval::{run_batch, BatchConfig, EmptyPolicy};
    pub use keelung_panel::{DailyPanel, HoldingMatrix, MonthlyPanel, QuarterlyPanel};
    pub use keelung_signals::{build_pool, panel_keys, standard_rules, HoldingRule, PanelSet, Pool};
    pub use keelung_traits::{Date, KeelungError, Month, Quarter, Result, Symbol};
}
