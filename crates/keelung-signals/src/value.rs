//! Low-ratio value rules: price/earnings, price/book, market beta.

use std::collections::BTreeMap;

use keelung_panel::HoldingMatrix;
use keelung_traits::{Result, Symbol};
use serde::{Deserialize, Serialize};

use crate::rule::{panel_keys, HoldingRule, PanelSet, Rebalance};
use crate::select;

/// Configuration for a low-ratio value rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueLowConfig {
    /// Key of the monthly ratio panel to rank.
    pub panel_key: String,

    /// Fraction of the filtered cross-section to keep (default: 0.30).
    pub bottom_fraction: f64,

    /// Drop non-positive ratios **before** ranking (default: true).
    pub require_positive: bool,
}

/// Low-ratio value rule: last month's ratio cross-section, restricted to
/// last month's universe, picks the smallest `bottom_fraction` for holding
/// through the current month.
///
/// Unlike momentum, the positivity filter runs before the fractional cut,
/// so the fraction is computed over the already-filtered population.
#[derive(Debug, Clone)]
pub struct ValueLow {
    name: String,
    config: ValueLowConfig,
}

impl ValueLow {
    /// Creates a value rule over the given panel key.
    #[must_use]
    pub fn new(name: impl Into<String>, config: ValueLowConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    /// Low price/earnings.
    #[must_use]
    pub fn pe_low() -> Self {
        Self::new(
            "pe_low",
            ValueLowConfig {
                panel_key: panel_keys::PE_RATIO.to_string(),
                bottom_fraction: 0.30,
                require_positive: true,
            },
        )
    }

    /// Low price/book.
    #[must_use]
    pub fn pb_low() -> Self {
        Self::new(
            "pb_low",
            ValueLowConfig {
                panel_key: panel_keys::PB_RATIO.to_string(),
                bottom_fraction: 0.30,
                require_positive: true,
            },
        )
    }

    /// Low market beta (defensive tilt via the same selection machinery).
    #[must_use]
    pub fn beta_low() -> Self {
        Self::new(
            "beta_low",
            ValueLowConfig {
                panel_key: panel_keys::BETA.to_string(),
                bottom_fraction: 0.30,
                require_positive: true,
            },
        )
    }
}

impl HoldingRule for ValueLow {
    fn name(&self) -> &str {
        &self.name
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

            let picks = select::bottom_fraction(&scores, self.config.bottom_fraction);
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

    fn ten_names() -> Vec<String> {
        (0..10).map(|i| format!("S{i:02}")).collect()
    }

    fn fixture() -> PanelSet {
        let names = ten_names();
        let mut obs = Vec::new();
        for n in &names {
            obs.push((d(2021, 1, 29), n.clone(), 0.0));
            obs.push((d(2021, 2, 1), n.clone(), 0.01));
        }
        let returns = DailyPanel::from_observations(obs);

        // Unique ratios 1..=10 observed in January.
        let pe = MonthlyPanel::from_observations(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| (m(2021, 1), n.clone(), (i + 1) as f64)),
        );

        let pool = Pool::from_members(vec![(m(2021, 1), names.into_iter().collect())]);
        PanelSet::new(returns, pool).with_monthly(panel_keys::PE_RATIO, pe)
    }

    /// Ten unique ratios 1..10 with a 30% cut select exactly the three
    /// smallest, held through the following month.
    #[test]
    fn test_bottom_fraction_of_ten() {
        let matrix = ValueLow::pe_low().holdings(&fixture()).unwrap();
        for held in ["S00", "S01", "S02"] {
            assert!(matrix.is_held(d(2021, 2, 1), held), "{held} missing");
        }
        for absent in ["S03", "S09"] {
            assert!(!matrix.is_held(d(2021, 2, 1), absent));
        }
        // Decision month itself carries no holdings.
        assert!(!matrix.is_held(d(2021, 1, 29), "S00"));
    }

    /// Non-positive ratios leave the population before the fraction is
    /// computed, shrinking k.
    #[test]
    fn test_filter_before_fraction() {
        let names = ten_names();
        let mut obs = Vec::new();
        for n in &names {
            obs.push((d(2021, 2, 1), n.clone(), 0.01));
        }
        let returns = DailyPanel::from_observations(obs);

        // Only three positive ratios; k = ceil(3 * 0.3) = 1.
        let pe = MonthlyPanel::from_observations(names.iter().enumerate().map(|(i, n)| {
            let v = if i < 7 { -1.0 } else { (i + 1) as f64 };
            (m(2021, 1), n.clone(), v)
        }));
        let pool = Pool::from_members(vec![(m(2021, 1), names.into_iter().collect())]);
        let inputs = PanelSet::new(returns, pool).with_monthly(panel_keys::PE_RATIO, pe);

        let matrix = ValueLow::pe_low().holdings(&inputs).unwrap();
        assert!(matrix.is_held(d(2021, 2, 1), "S07"));
        assert!(!matrix.is_held(d(2021, 2, 1), "S08"));
        assert!(!matrix.is_held(d(2021, 2, 1), "S00"));
    }

    #[test]
    fn test_missing_panel_is_fatal() {
        let returns = DailyPanel::from_observations(vec![(
            d(2021, 2, 1),
            "AAA".to_string(),
            0.01,
        )]);
        let inputs = PanelSet::new(returns, Pool::default());
        assert!(ValueLow::pe_low().holdings(&inputs).is_err());
    }

    #[test]
    fn test_no_decision_row_yields_zero_month() {
        // Panel exists but has no January row; February stays empty.
        let inputs = {
            let names = ten_names();
            let returns = DailyPanel::from_observations(
                names.iter().map(|n| (d(2021, 2, 1), n.clone(), 0.01)),
            );
            let pe = MonthlyPanel::from_observations(
                names
                    .iter()
                    .map(|n| (m(2020, 11), n.clone(), 5.0)),
            );
            let pool = Pool::from_members(vec![(m(2021, 1), names.into_iter().collect())]);
            PanelSet::new(returns, pool).with_monthly(panel_keys::PE_RATIO, pe)
        };
        let matrix = ValueLow::pe_low().holdings(&inputs).unwrap();
        assert!(matrix.is_all_zero());
    }
}
