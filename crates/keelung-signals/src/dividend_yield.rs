//! High dividend yield rule.

use std::collections::BTreeMap;

use keelung_panel::HoldingMatrix;
use keelung_traits::{Result, Symbol};
use serde::{Deserialize, Serialize};

use crate::rule::{panel_keys, HoldingRule, PanelSet, Rebalance};
use crate::select;

/// Configuration for the high-yield rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldHighConfig {
    /// Key of the monthly dividend yield panel.
    pub panel_key: String,

    /// Fraction of the filtered cross-section to keep (default: 0.30).
    pub top_fraction: f64,

    /// Drop non-positive yields before ranking (default: false; reported
    /// yields are non-negative already and zero-yield names lose the
    /// ranking anyway).
    pub require_positive: bool,
}

impl Default for YieldHighConfig {
    fn default() -> Self {
        Self {
            panel_key: panel_keys::DIVIDEND_YIELD.to_string(),
            top_fraction: 0.30,
            require_positive: false,
        }
    }
}

/// High-yield rule: last month's dividend yield cross-section, restricted
/// to last month's universe, picks the largest `top_fraction` for holding
/// through the current month.
///
/// Like the value rules (and unlike momentum), the optional positivity
/// filter runs before the fractional cut.
#[derive(Debug, Clone)]
pub struct YieldHigh {
    config: YieldHighConfig,
}

impl YieldHigh {
    /// Creates a high-yield rule with the given configuration.
    #[must_use]
    pub const fn new(config: YieldHighConfig) -> Self {
        Self { config }
    }
}

impl Default for YieldHigh {
    fn default() -> Self {
        Self::new(YieldHighConfig::default())
    }
}

impl HoldingRule for YieldHigh {
    fn name(&self) -> &str {
        "yield_high"
    }

    fn cadence(&self) -> Rebalance {
        Rebalance::Monthly
    }

    fn holdings(&self, inputs: &PanelSet) -> Result<HoldingMatrix> {
        let panel = inputs.monthly(&self.config.panel_key)?;
        let returns = inputs.returns();
        let cal = returns.calendar();
        let mut matrix = HoldingMatrix::empty(cal.clone());

        for holding in cal.months() {
            let decision = holding - 1;
            let universe = inputs.universe(decision);
            if universe.is_empty() {
                continue;
            }
            let Some(row) = panel.row(decision) else {
                continue;
            };

            let mut scores: BTreeMap<Symbol, f64> = BTreeMap::new();
            for symbol in &universe {
                if let Some(&v) = row.get(symbol) {
                    if self.config.require_positive && v <= 0.0 {
                        continue;
                    }
                    scores.insert(symbol.clone(), v);
                }
            }
            if scores.is_empty() {
                continue;
            }

            let picks = select::top_fraction(&scores, self.config.top_fraction);
            matrix.mark_days(cal.days_in_month(holding), &picks);
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::Pool;
    use keelung_panel::{DailyPanel, MonthlyPanel};
    use keelung_traits::{Date, Month};

    fn d(y: i32, mo: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, mo, day).unwrap()
    }

    fn m(y: i32, mo: u32) -> Month {
        Month::new(y, mo).unwrap()
    }

    #[test]
    fn test_selects_largest_yields() {
        let names: Vec<String> = (0..4).map(|i| format!("S{i}")).collect();
        let returns = DailyPanel::from_observations(
            names.iter().map(|n| (d(2021, 2, 1), n.clone(), 0.01)),
        );
        let dy = MonthlyPanel::from_observations(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| (m(2021, 1), n.clone(), i as f64)),
        );
        let pool = Pool::from_members(vec![(m(2021, 1), names.into_iter().collect())]);
        let inputs = PanelSet::new(returns, pool).with_monthly(panel_keys::DIVIDEND_YIELD, dy);

        // k = ceil(4 * 0.3) = 2: the two highest yields.
        let matrix = YieldHigh::default().holdings(&inputs).unwrap();
        assert!(matrix.is_held(d(2021, 2, 1), "S3"));
        assert!(matrix.is_held(d(2021, 2, 1), "S2"));
        assert!(!matrix.is_held(d(2021, 2, 1), "S1"));
        // Zero yield survives the default config (no positivity filter)
        // but not the ranking.
        assert!(!matrix.is_held(d(2021, 2, 1), "S0"));
    }

    #[test]
    fn test_positivity_filter_opt_in() {
        let names: Vec<String> = (0..2).map(|i| format!("S{i}")).collect();
        let returns = DailyPanel::from_observations(
            names.iter().map(|n| (d(2021, 2, 1), n.clone(), 0.01)),
        );
        // Both yields are zero: with the filter on, nothing qualifies.
        let dy = MonthlyPanel::from_observations(
            names.iter().map(|n| (m(2021, 1), n.clone(), 0.0)),
        );
        let pool = Pool::from_members(vec![(m(2021, 1), names.into_iter().collect())]);
        let inputs = PanelSet::new(returns, pool).with_monthly(panel_keys::DIVIDEND_YIELD, dy);

        let rule = YieldHigh::new(YieldHighConfig {
            require_positive: true,
            ..YieldHighConfig::default()
        });
        assert!(rule.holdings(&inputs).unwrap().is_all_zero());
    }
}
