//! Trend composite rule: price trend, EPS trend and valuation.

use std::collections::BTreeMap;

use keelung_panel::HoldingMatrix;
use keelung_traits::{Result, Symbol};
use serde::{Deserialize, Serialize};

use crate::eps::{eps_directions, EpsDirection};
use crate::rule::{panel_keys, HoldingRule, PanelSet, Rebalance};
use crate::select;

/// Configuration for the trend composite rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuanTrendConfig {
    /// Key of the monthly estimated-EPS panel.
    pub eps_key: String,

    /// Key of the monthly price/earnings panel.
    pub pe_key: String,

    /// Moving-average window in trading days (default: 60).
    pub ma_window: usize,

    /// Fixed number of names to select by ascending valuation
    /// (default: 20).
    pub n_select: usize,

    /// Drop non-positive price/earnings readings (default: true).
    pub require_positive_pe: bool,
}

impl Default for QuanTrendConfig {
    fn default() -> Self {
        Self {
            eps_key: panel_keys::EPS_ESTIMATE.to_string(),
            pe_key: panel_keys::PE_RATIO.to_string(),
            ma_window: 60,
            n_select: 20,
            require_positive_pe: true,
        }
    }
}

/// Trend composite: three conditions evaluated at decision month t = m - 1
/// pick the holdings for month m (universe: pool at m).
///
/// 1. The `ma_window`-day moving average of the price at t's month end is
///    above the same average at t - 1's month end (both fully observed).
/// 2. The EPS direction state at t is `Up` (an exactly flat estimate keeps
///    an earlier uptrend alive).
/// 3. Among names passing both, the `n_select` cheapest by the
///    price/earnings cross-section at t.
#[derive(Debug, Clone)]
pub struct QuanTrend {
    config: QuanTrendConfig,
}

impl QuanTrend {
    /// Creates a trend composite rule with the given configuration.
    #[must_use]
    pub const fn new(config: QuanTrendConfig) -> Self {
        Self { config }
    }
}

impl Default for QuanTrend {
    fn default() -> Self {
        Self::new(QuanTrendConfig::default())
    }
}

impl HoldingRule for QuanTrend {
    fn name(&self) -> &str {
        "quantrend"
    }

    fn cadence(&self) -> Rebalance {
        Rebalance::Monthly
    }

    fn holdings(&self, inputs: &PanelSet) -> Result<HoldingMatrix> {
        let prices = inputs.prices()?;
        let eps = inputs.monthly(&self.config.eps_key)?;
        let pe = inputs.monthly(&self.config.pe_key)?;
        let returns = inputs.returns();
        let cal = returns.calendar();
        let mut matrix = HoldingMatrix::empty(cal.clone());

        let directions = eps_directions(eps);

        for holding in cal.months() {
            let decision = holding - 1;
            let prior = holding - 2;
            let universe = inputs.universe(holding);
            if universe.is_empty() {
                continue;
            }

            // Both comparison rows must exist in the estimate panel before
            // any name can qualify.
            if eps.row(decision).is_none() || eps.row(prior).is_none() {
                continue;
            }
            let Some(dir_row) = directions.get(&decision) else {
                continue;
            };
            let Some(pe_row) = pe.row(decision) else {
                continue;
            };
            let (Some(end_t), Some(end_p)) = (
                prices.calendar().last_trading_day(decision),
                prices.calendar().last_trading_day(prior),
            ) else {
                continue;
            };

            let mut candidates: Vec<&Symbol> = Vec::new();
            for symbol in &universe {
                let (Some(ma_t), Some(ma_p)) = (
                    prices.moving_average_at(end_t, symbol, self.config.ma_window),
                    prices.moving_average_at(end_p, symbol, self.config.ma_window),
                ) else {
                    continue;
                };
                if ma_t <= ma_p {
                    continue;
                }
                if dir_row.get(symbol) != Some(&EpsDirection::Up) {
                    continue;
                }
                candidates.push(symbol);
            }
            if candidates.is_empty() {
                continue;
            }

            let mut valuations: BTreeMap<Symbol, f64> = BTreeMap::new();
            for symbol in candidates {
                if let Some(&v) = pe_row.get(symbol) {
                    if !v.is_finite() {
                        continue;
                    }
                    if self.config.require_positive_pe && v <= 0.0 {
                        continue;
                    }
                    valuations.insert(symbol.clone(), v);
                }
            }
            if valuations.is_empty() {
                continue;
            }

            let picks = select::smallest_n(&valuations, self.config.n_select);
            matrix.mark_days(cal.days_in_month(holding), &picks);
        }
        Ok(matrix)
    }
}
