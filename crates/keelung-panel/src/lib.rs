#![doc(issue_tracker_base_url = "https://github.com/factordynamics/keelung/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Trading calendar and time-series panel containers for Keelung.
//!
//! Panels are sparse in-memory mappings from (period, symbol) to values,
//! built either directly from observations or from long-format Polars
//! DataFrames handed over by an ingestion layer. Three granularities exist:
//!
//! - [`DailyPanel`]: returns or prices on trading dates;
//! - [`MonthlyPanel`]: one fundamental cross-section per month;
//! - [`QuarterlyPanel`]: statement data normalized to quarters.
//!
//! [`HoldingMatrix`] is the output side: a daily 0/1 indicator matrix over
//! the returns panel's [`TradingCalendar`].

/// The version of the keelung-panel crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod calendar;
pub mod daily;
pub mod holding;
pub mod monthly;
pub mod quarterly;

// Re-exports
pub use calendar::TradingCalendar;
pub use daily::DailyPanel;
pub use holding::HoldingMatrix;
pub use monthly::MonthlyPanel;
pub use quarterly::QuarterlyPanel;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
