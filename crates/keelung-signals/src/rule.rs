//! The decision-rule contract and its immutable input bundle.
//!
//! Every factor is a [`HoldingRule`]: a pure function from a shared
//! [`PanelSet`] to a daily [`HoldingMatrix`]. Rules never mutate their
//! inputs, so a batch of factors can run concurrently over one `PanelSet`.

use std::collections::BTreeMap;

use keelung_panel::{DailyPanel, HoldingMatrix, MonthlyPanel, QuarterlyPanel};
use keelung_traits::{KeelungError, Month, Result, Symbol};
use serde::{Deserialize, Serialize};

use crate::universe::Pool;

/// Well-known panel keys used by the standard rule set.
///
/// Callers may register panels under any name; these constants only fix the
/// names the default-configured rules look up.
pub mod panel_keys {
    /// Monthly price/earnings ratio.
    pub const PE_RATIO: &str = "pe_ratio";
    /// Monthly price/book ratio.
    pub const PB_RATIO: &str = "pb_ratio";
    /// Monthly market beta.
    pub const BETA: &str = "beta";
    /// Monthly dividend yield.
    pub const DIVIDEND_YIELD: &str = "dividend_yield";
    /// Monthly year-over-year earnings growth.
    pub const EARNINGS_YOY: &str = "earnings_yoy";
    /// Monthly estimated earnings per share.
    pub const EPS_ESTIMATE: &str = "eps_estimate";
    /// Gross margin statement announcements, keyed by announce month.
    pub const GROSS_MARGIN: &str = "gross_margin";
    /// Operating margin statement announcements, keyed by announce month.
    pub const OPERATING_MARGIN: &str = "operating_margin";
    /// Operating margin by reporting quarter.
    pub const OPERATING_MARGIN_Q: &str = "operating_margin_q";
}

/// Rebalance cadence of a decision rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum Rebalance {
    /// One decision per calendar month.
    #[display("monthly")]
    Monthly,
    /// One decision per reporting quarter, expanded to daily windows.
    #[display("quarterly")]
    Quarterly,
}

/// The immutable input bundle shared by every decision rule.
///
/// Holds the daily returns panel (whose calendar is the date index of every
/// output matrix), an optional daily price panel, named monthly and
/// quarterly factor panels, and the point-in-time eligibility [`Pool`].
#[derive(Debug, Clone)]
pub struct PanelSet {
    returns: DailyPanel,
    prices: Option<DailyPanel>,
    monthly: BTreeMap<String, MonthlyPanel>,
    quarterly: BTreeMap<String, QuarterlyPanel>,
    pool: Pool,
}

impl PanelSet {
    /// Creates a panel set from the returns panel and eligibility pool.
    #[must_use]
    pub const fn new(returns: DailyPanel, pool: Pool) -> Self {
        Self {
            returns,
            prices: None,
            monthly: BTreeMap::new(),
            quarterly: BTreeMap::new(),
            pool,
        }
    }

    /// Attaches a daily price panel.
    #[must_use]
    pub fn with_prices(mut self, prices: DailyPanel) -> Self {
        self.prices = Some(prices);
        self
    }

    /// Registers a monthly panel under `key`.
    #[must_use]
    pub fn with_monthly(mut self, key: impl Into<String>, panel: MonthlyPanel) -> Self {
        self.monthly.insert(key.into(), panel);
        self
    }

    /// Registers a quarterly panel under `key`.
    #[must_use]
    pub fn with_quarterly(mut self, key: impl Into<String>, panel: QuarterlyPanel) -> Self {
        self.quarterly.insert(key.into(), panel);
        self
    }

    /// The daily returns panel.
    #[must_use]
    pub const fn returns(&self) -> &DailyPanel {
        &self.returns
    }

    /// The daily price panel.
    ///
    /// # Errors
    ///
    /// [`KeelungError::MissingInputPanel`] when no price panel was attached.
    pub fn prices(&self) -> Result<&DailyPanel> {
        self.prices
            .as_ref()
            .ok_or_else(|| KeelungError::MissingInputPanel("prices".to_string()))
    }

    /// The monthly panel registered under `key`.
    ///
    /// # Errors
    ///
    /// [`KeelungError::MissingInputPanel`] when no such panel exists; a rule
    /// missing its input is a caller contract violation, never silently
    /// defaulted.
    pub fn monthly(&self, key: &str) -> Result<&MonthlyPanel> {
        self.monthly
            .get(key)
            .ok_or_else(|| KeelungError::MissingInputPanel(key.to_string()))
    }

    /// The quarterly panel registered under `key`.
    ///
    /// # Errors
    ///
    /// [`KeelungError::MissingInputPanel`] when no such panel exists.
    pub fn quarterly(&self, key: &str) -> Result<&QuarterlyPanel> {
        self.quarterly
            .get(key)
            .ok_or_else(|| KeelungError::MissingInputPanel(key.to_string()))
    }

    /// The point-in-time eligibility pool.
    #[must_use]
    pub const fn pool(&self) -> &Pool {
        &self.pool
    }

    /// The base universe for a holding decision: pool members at `month`
    /// intersected with the symbols actually present in the returns panel,
    /// sorted ascending.
    #[must_use]
    pub fn universe(&self, month: Month) -> Vec<Symbol> {
        self.pool.members(month).map_or_else(Vec::new, |set| {
            set.iter()
                .filter(|s| self.returns.has_symbol(s))
                .cloned()
                .collect()
        })
    }
}

/// A factor decision rule: pure function from panels to daily holdings.
///
/// Implementations must be `Send + Sync`; the batch engine runs rules
/// concurrently over one shared [`PanelSet`]. Identical inputs must produce
/// identical matrices.
pub trait HoldingRule: Send + Sync {
    /// Unique factor name, used as the output map key.
    fn name(&self) -> &str;

    /// The rule's rebalance cadence.
    fn cadence(&self) -> Rebalance;

    /// Computes the daily 0/1 holding matrix.
    ///
    /// Months (or quarters) with no qualifying identifiers contribute
    /// all-zero holdings; that is a valid outcome, not an error.
    ///
    /// # Errors
    ///
    /// Rules fail only on caller contract violations, chiefly
    /// [`KeelungError::MissingInputPanel`].
    fn holdings(&self, inputs: &PanelSet) -> Result<HoldingMatrix>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use keelung_panel::DailyPanel;
    use keelung_traits::Date;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn m(y: i32, mo: u32) -> Month {
        Month::new(y, mo).unwrap()
    }

    fn sample_set() -> PanelSet {
        let returns = DailyPanel::from_observations(vec![
            (d(2021, 1, 4), "AAA".to_string(), 0.01),
            (d(2021, 1, 4), "BBB".to_string(), 0.02),
        ]);
        let pool = Pool::from_members(vec![(
            m(2021, 1),
            ["AAA".to_string(), "CCC".to_string()].into_iter().collect(),
        )]);
        PanelSet::new(returns, pool)
    }

    #[test]
    fn test_universe_intersects_returns_symbols() {
        let inputs = sample_set();
        // CCC is in the pool but absent from returns; BBB is in returns but
        // not in the pool.
        assert_eq!(inputs.universe(m(2021, 1)), vec!["AAA".to_string()]);
        assert!(inputs.universe(m(2021, 2)).is_empty());
    }

    #[test]
    fn test_missing_panels_are_contract_violations() {
        let inputs = sample_set();
        assert!(matches!(
            inputs.monthly("pe_ratio").unwrap_err(),
            KeelungError::MissingInputPanel(_)
        ));
        assert!(matches!(
            inputs.prices().unwrap_err(),
            KeelungError::MissingInputPanel(_)
        ));
    }

    #[test]
    fn test_rule_object_safety() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn HoldingRule>();
    }
}
