//! Point-in-time eligible universe construction.
//!
//! The pool for holding month p is ranked from market capitalization
//! observed at p - 1, so universe membership never leaks information from
//! the month it applies to.

use std::collections::{BTreeMap, BTreeSet};

use keelung_panel::{HoldingMatrix, MonthlyPanel};
use keelung_traits::{Month, Result, Symbol};

use crate::rule::{HoldingRule, PanelSet, Rebalance};
use crate::select;

/// The point-in-time eligible universe: holding month -> symbol set.
///
/// Built once per universe definition and immutable thereafter; every
/// decision rule shares it read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pool {
    members: BTreeMap<Month, BTreeSet<Symbol>>,
}

impl Pool {
    /// Builds a pool directly from per-month member sets (mainly for tests
    /// and fixtures).
    #[must_use]
    pub fn from_members<I>(members: I) -> Self
    where
        I: IntoIterator<Item = (Month, BTreeSet<Symbol>)>,
    {
        Self {
            members: members.into_iter().collect(),
        }
    }

    /// The eligible set for holding month `month`, if any.
    #[must_use]
    pub fn members(&self, month: Month) -> Option<&BTreeSet<Symbol>> {
        self.members.get(&month)
    }

    /// The holding months with a defined universe, ascending.
    #[must_use]
    pub fn months(&self) -> Vec<Month> {
        self.members.keys().copied().collect()
    }

    /// Whether the pool has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Ranks each month's market capitalization cross-section and assigns the
/// `top_n` largest names (ties by symbol ascending, missing values excluded)
/// to the **following** month, minus `exclude` members.
///
/// An empty input panel yields an empty pool.
#[must_use]
pub fn build_pool(
    market_cap: &MonthlyPanel,
    top_n: usize,
    exclude: &BTreeSet<Symbol>,
) -> Pool {
    let mut members = BTreeMap::new();
    for month in market_cap.months() {
        let Some(row) = market_cap.row(month) else {
            continue;
        };
        let ranked = select::largest_n(row, top_n);
        let selected: BTreeSet<Symbol> = ranked
            .into_iter()
            .filter(|s| !exclude.contains(s))
            .collect();
        members.insert(month + 1, selected);
    }
    Pool { members }
}

/// The eligibility pool itself as a baseline factor: the names eligible at
/// month m are held through month m + 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopPool;

impl HoldingRule for TopPool {
    fn name(&self) -> &str {
        "top_pool"
    }

    fn cadence(&self) -> Rebalance {
        Rebalance::Monthly
    }

    fn holdings(&self, inputs: &PanelSet) -> Result<HoldingMatrix> {
        let returns = inputs.returns();
        let cal = returns.calendar();
        let mut matrix = HoldingMatrix::empty(cal.clone());

        for month in cal.months() {
            let sample = inputs.universe(month);
            if sample.is_empty() {
                continue;
            }
            matrix.mark_days(cal.days_in_month(month + 1), &sample);
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keelung_panel::DailyPanel;
    use keelung_traits::Date;

    fn m(y: i32, mo: u32) -> Month {
        Month::new(y, mo).unwrap()
    }

    fn d(y: i32, mo: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, mo, day).unwrap()
    }

    fn caps(rows: &[(Month, &[(&str, f64)])]) -> MonthlyPanel {
        MonthlyPanel::from_observations(rows.iter().flat_map(|(month, row)| {
            row.iter().map(move |(s, v)| (*month, s.to_string(), *v))
        }))
    }

    #[test]
    fn test_pool_is_point_in_time() {
        // Rankings flip between January and February; each pool entry must
        // reflect the previous month's data only.
        let mc = caps(&[
            (m(2021, 1), &[("AAA", 300.0), ("BBB", 200.0), ("CCC", 100.0)]),
            (m(2021, 2), &[("AAA", 100.0), ("BBB", 200.0), ("CCC", 300.0)]),
        ]);
        let pool = build_pool(&mc, 2, &BTreeSet::new());

        let feb: Vec<_> = pool.members(m(2021, 2)).unwrap().iter().cloned().collect();
        assert_eq!(feb, vec!["AAA".to_string(), "BBB".to_string()]);

        let mar: Vec<_> = pool.members(m(2021, 3)).unwrap().iter().cloned().collect();
        assert_eq!(mar, vec!["BBB".to_string(), "CCC".to_string()]);

        // No entry is keyed by a month whose own data produced it.
        assert!(pool.members(m(2021, 1)).is_none());
    }

    #[test]
    fn test_missing_values_excluded_and_ties_deterministic() {
        let mc = MonthlyPanel::from_observations(vec![
            (m(2021, 1), "AAA".to_string(), 100.0),
            (m(2021, 1), "BBB".to_string(), 100.0),
            (m(2021, 1), "CCC".to_string(), f64::NAN),
        ]);
        let pool = build_pool(&mc, 1, &BTreeSet::new());
        let feb: Vec<_> = pool.members(m(2021, 2)).unwrap().iter().cloned().collect();
        // Tie between AAA and BBB resolves to the ascending symbol.
        assert_eq!(feb, vec!["AAA".to_string()]);
    }

    #[test]
    fn test_exclusions_removed_after_ranking() {
        let mc = caps(&[(
            m(2021, 1),
            &[("AAA", 300.0), ("BBB", 200.0), ("CCC", 100.0)],
        )]);
        let exclude: BTreeSet<Symbol> = ["AAA".to_string()].into_iter().collect();
        let pool = build_pool(&mc, 2, &exclude);
        let feb: Vec<_> = pool.members(m(2021, 2)).unwrap().iter().cloned().collect();
        // AAA occupied a top-2 slot before removal; BBB remains, CCC does
        // not move up.
        assert_eq!(feb, vec!["BBB".to_string()]);
    }

    #[test]
    fn test_empty_panel_yields_empty_pool() {
        let pool = build_pool(&MonthlyPanel::default(), 10, &BTreeSet::new());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_top_pool_holds_next_month() {
        let returns = DailyPanel::from_observations(vec![
            (d(2021, 1, 4), "AAA".to_string(), 0.01),
            (d(2021, 2, 1), "AAA".to_string(), 0.01),
            (d(2021, 2, 2), "AAA".to_string(), 0.02),
        ]);
        let pool = Pool::from_members(vec![(
            m(2021, 1),
            ["AAA".to_string()].into_iter().collect(),
        )]);
        let inputs = PanelSet::new(returns, pool);

        let matrix = TopPool.holdings(&inputs).unwrap();
        assert!(!matrix.is_held(d(2021, 1, 4), "AAA"));
        assert!(matrix.is_held(d(2021, 2, 1), "AAA"));
        assert!(matrix.is_held(d(2021, 2, 2), "AAA"));
    }
}
