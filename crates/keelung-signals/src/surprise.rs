//! Margin surprise index rule.
//!
//! For each reporting quarter, the surprise index nets the year-over-year
//! margin change against the price move that already happened between the
//! two announcement dates: a margin jump the market has not yet priced
//! scores high, a jump that was front-run scores low.

use std::collections::BTreeMap;

use keelung_panel::HoldingMatrix;
use keelung_traits::{Date, Quarter, Result, Symbol};
use serde::{Deserialize, Serialize};

use crate::margin::{expand_quarter_decisions, QuarterDecision};
use crate::rule::{panel_keys, HoldingRule, PanelSet, Rebalance};
use crate::select;

/// Configuration for the margin-surprise rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginSurpriseConfig {
    /// Key of the quarterly margin panel.
    pub margin_key: String,

    /// Fraction of the positive-surprise cross-section to keep
    /// (default: 0.20).
    pub top_fraction: f64,

    /// Restrict the cross-section to names with a positive margin level in
    /// the scored quarter (default: false).
    pub require_positive_margin: bool,
}

impl Default for MarginSurpriseConfig {
    fn default() -> Self {
        Self {
            margin_key: panel_keys::OPERATING_MARGIN_Q.to_string(),
            top_fraction: 0.20,
            require_positive_margin: false,
        }
    }
}

/// Margin-surprise rule.
///
/// Per quarter q: dMargin(q) = margin(q) - margin(q - 4); the announcement
/// date is approximated by the last trading day of the announce month;
/// PR(q - 1) is the price return from the day after announce(q - 1) to the
/// day before announce(q); the surprise index is
/// Z(dMargin(q)) - Z(PR(q - 1)) over the quarter's cross-section. Names
/// with a positive index rank into the top `top_fraction`, and the
/// selection expands into daily windows exactly like the margin-growth
/// rule, including the monthly pool intersection. A degenerate
/// cross-section (zero variance on either z-score input) yields no
/// qualifying names for that quarter.
#[derive(Debug, Clone)]
pub struct MarginSurprise {
    config: MarginSurpriseConfig,
}

impl MarginSurprise {
    /// Creates a margin-surprise rule with the given configuration.
    #[must_use]
    pub const fn new(config: MarginSurpriseConfig) -> Self {
        Self { config }
    }
}

impl Default for MarginSurprise {
    fn default() -> Self {
        Self::new(MarginSurpriseConfig::default())
    }
}

impl HoldingRule for MarginSurprise {
    fn name(&self) -> &str {
        "margin_surprise"
    }

    fn cadence(&self) -> Rebalance {
        Rebalance::Quarterly
    }

    fn holdings(&self, inputs: &PanelSet) -> Result<HoldingMatrix> {
        let prices = inputs.prices()?;
        let margin = inputs.quarterly(&self.config.margin_key)?;
        let returns = inputs.returns();
        let cal = returns.calendar();
        let mut matrix = HoldingMatrix::empty(cal.clone());

        // Symbols must be observable on both the returns and price panels.
        let common: Vec<Symbol> = returns
            .symbols()
            .iter()
            .filter(|s| prices.has_symbol(s))
            .cloned()
            .collect();
        if common.is_empty() {
            return Ok(matrix);
        }

        // Announcement dates: the last trading day of each announce month.
        let price_cal = prices.calendar();
        let mut announce: BTreeMap<Quarter, Date> = BTreeMap::new();
        for quarter in margin.quarters() {
            if let Some(date) = price_cal.last_trading_day(quarter.announce_month()) {
                announce.insert(quarter, date);
            }
        }

        let mut decisions: Vec<QuarterDecision> = Vec::new();
        for (&quarter, &announced) in &announce {
            // Pre-announcement price reaction: the day after the previous
            // announcement through the day before this one, at least two
            // trading days apart.
            let Some(&prev_announced) = announce.get(&(quarter - 1)) else {
                continue;
            };
            let (Some(prev_pos), Some(curr_pos)) = (
                price_cal.position(prev_announced),
                price_cal.position(announced),
            ) else {
                continue;
            };
            let start_pos = prev_pos + 1;
            let Some(end_pos) = curr_pos.checked_sub(1) else {
                continue;
            };
            if start_pos >= price_cal.len() || end_pos <= start_pos {
                continue;
            }
            let (Some(window_start), Some(window_end)) =
                (price_cal.date_at(start_pos), price_cal.date_at(end_pos))
            else {
                continue;
            };

            let mut delta: BTreeMap<Symbol, f64> = BTreeMap::new();
            let mut reaction: BTreeMap<Symbol, f64> = BTreeMap::new();
            for symbol in &common {
                if self.config.require_positive_margin
                    && margin.value(quarter, symbol).is_none_or(|v| v <= 0.0)
                {
                    continue;
                }
                if let (Some(curr), Some(base)) = (
                    margin.value(quarter, symbol),
                    margin.value(quarter - 4, symbol),
                ) {
                    delta.insert(symbol.clone(), curr - base);
                }
                if let Some(pr) = prices.window_return(window_start, window_end, symbol) {
                    reaction.insert(symbol.clone(), pr);
                }
            }

            let (Some(z_delta), Some(z_reaction)) =
                (select::zscore_map(&delta), select::zscore_map(&reaction))
            else {
                continue;
            };

            let mut surprise: BTreeMap<Symbol, f64> = BTreeMap::new();
            for (symbol, zd) in &z_delta {
                if let Some(zr) = z_reaction.get(symbol) {
                    let si = zd - zr;
                    if si.is_finite() && si > 0.0 {
                        surprise.insert(symbol.clone(), si);
                    }
                }
            }
            if surprise.is_empty() {
                continue;
            }

            let picks = select::top_fraction(&surprise, self.config.top_fraction);
            let Some(start) = cal.last_trading_day(quarter.entry_month()) else {
                continue;
            };
            decisions.push(QuarterDecision {
                start,
                picks: picks.into_iter().collect(),
            });
        }
        decisions.sort_by_key(|d| d.start);

        expand_quarter_decisions(&decisions, cal, inputs.pool(), &mut matrix);
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::Pool;
    use chrono::Datelike;
    use keelung_panel::{DailyPanel, QuarterlyPanel};
    use keelung_traits::Month;

    fn d(y: i32, mo: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, mo, day).unwrap()
    }

    fn m(y: i32, mo: u32) -> Month {
        Month::new(y, mo).unwrap()
    }

    fn q(y: i32, qt: u32) -> Quarter {
        Quarter::new(y, qt).unwrap()
    }

    fn weekdays(from: Date, to: Date) -> Vec<Date> {
        let mut out = Vec::new();
        let mut date = from;
        while date <= to {
            if !matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
                out.push(date);
            }
            date = date.succ_opt().unwrap();
        }
        out
    }

    /// Three names with flat prices; margins for 2021Q1 vs 2020Q1 diverge.
    /// With identical price reactions, the surprise ranking reduces to the
    /// margin delta ranking.
    fn fixture() -> PanelSet {
        let names = ["AAA", "BBB", "CCC"];
        let days = weekdays(d(2020, 1, 1), d(2021, 12, 31));
        let mut ret_obs = Vec::new();
        let mut px_obs = Vec::new();
        for (i, n) in names.iter().enumerate() {
            // Distinct flat price levels; equal (zero) returns everywhere.
            for &day in &days {
                ret_obs.push((day, n.to_string(), 0.0));
                px_obs.push((day, n.to_string(), 100.0 + i as f64));
            }
        }
        let returns = DailyPanel::from_observations(ret_obs);
        let prices = DailyPanel::from_observations(px_obs);

        let mut margin_obs = Vec::new();
        for (i, n) in names.iter().enumerate() {
            // Year-over-year change: AAA +0.00, BBB +0.05, CCC +0.10.
            for quarter in [q(2020, 1), q(2020, 2), q(2020, 3), q(2020, 4)] {
                margin_obs.push((quarter, n.to_string(), 0.10));
            }
            margin_obs.push((q(2021, 1), n.to_string(), 0.10 + 0.05 * i as f64));
        }
        let margin = QuarterlyPanel::from_observations(margin_obs);

        let months: Vec<Month> = (1..=12)
            .map(|mo| m(2021, mo))
            .chain((1..=12).map(|mo| m(2020, mo)))
            .collect();
        let pool = Pool::from_members(months.into_iter().map(|mo| {
            (
                mo,
                names.iter().map(|n| n.to_string()).collect(),
            )
        }));

        PanelSet::new(returns, pool)
            .with_prices(prices)
            .with_quarterly(panel_keys::OPERATING_MARGIN_Q, margin)
    }

    /// Price reactions are all equal, so their z-score is degenerate and no
    /// quarter qualifies, never a division error.
    #[test]
    fn test_degenerate_reaction_cross_section() {
        let inputs = fixture();
        let matrix = MarginSurprise::default().holdings(&inputs).unwrap();
        assert!(matrix.is_all_zero());
    }

    /// With distinct price reactions, 2021Q1's selection enters at June's
    /// last trading day and the highest net surprise wins the 20% cut.
    #[test]
    fn test_selection_and_entry() {
        let names = ["AAA", "BBB", "CCC"];
        let days = weekdays(d(2020, 1, 1), d(2021, 12, 31));
        let mut ret_obs = Vec::new();
        let mut px_obs = Vec::new();
        for (i, n) in names.iter().enumerate() {
            // Prices drift upward at distinct per-name rates, so the
            // pre-announcement reaction differs across names.
            for (t, &day) in days.iter().enumerate() {
                ret_obs.push((day, n.to_string(), 0.0));
                let drift = 1.0 + (i as f64) * 0.0005;
                px_obs.push((day, n.to_string(), 100.0 * drift.powi(t as i32)));
            }
        }
        let returns = DailyPanel::from_observations(ret_obs);
        let prices = DailyPanel::from_observations(px_obs);

        let mut margin_obs = Vec::new();
        for (i, n) in names.iter().enumerate() {
            for quarter in [q(2020, 1), q(2020, 2), q(2020, 3), q(2020, 4)] {
                margin_obs.push((quarter, n.to_string(), 0.10));
            }
            // CCC has the largest margin jump but also the strongest
            // price run-up; BBB nets the best surprise is not obvious, so
            // give AAA the decisive jump with zero drift.
            margin_obs.push((q(2021, 1), n.to_string(), 0.10 + if i == 0 { 0.20 } else { 0.01 }));
        }
        let margin = QuarterlyPanel::from_observations(margin_obs);

        let months: Vec<Month> = (1..=12).map(|mo| m(2021, mo)).collect();
        let pool = Pool::from_members(months.into_iter().map(|mo| {
            (
                mo,
                names.iter().map(|n| n.to_string()).collect(),
            )
        }));

        let inputs = PanelSet::new(returns, pool)
            .with_prices(prices)
            .with_quarterly(panel_keys::OPERATING_MARGIN_Q, margin);

        let matrix = MarginSurprise::default().holdings(&inputs).unwrap();

        // 2021Q1 enters at June 2021's last trading day; the 20% cut of the
        // positive-surprise set picks AAA (large margin jump, weakest
        // run-up).
        let start = d(2021, 6, 30);
        assert!(matrix.is_held(start, "AAA"));
        assert!(!matrix.is_held(start, "CCC"));
        assert!(!matrix.is_held(d(2021, 6, 29), "AAA"));
    }

    #[test]
    fn test_missing_quarterly_panel_is_fatal() {
        let returns = DailyPanel::from_observations(vec![(
            d(2021, 1, 4),
            "AAA".to_string(),
            0.0,
        )]);
        let prices = DailyPanel::from_observations(vec![(
            d(2021, 1, 4),
            "AAA".to_string(),
            100.0,
        )]);
        let inputs = PanelSet::new(returns, Pool::default()).with_prices(prices);
        assert!(MarginSurprise::default().holdings(&inputs).is_err());
    }
}
