//! Equal-weight portfolio return aggregation.

use keelung_panel::{DailyPanel, HoldingMatrix};
use keelung_traits::Date;
use serde::{Deserialize, Serialize};

/// What a date with no held identifier contributes to the return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyPolicy {
    /// Flat: the portfolio sits in cash and earns exactly 0.0.
    Zero,
    /// Undefined: the value is NaN and downstream consumers decide.
    Undefined,
}

/// A daily return series aligned to a trading calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    dates: Vec<Date>,
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Builds a series from parallel date/value vectors.
    #[must_use]
    pub fn new(dates: Vec<Date>, values: Vec<f64>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        Self { dates, values }
    }

    /// The date index.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// The return values; NaN marks undefined entries.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Compounded cumulative returns; non-finite entries compound as flat.
    #[must_use]
    pub fn cumulative(&self) -> Vec<f64> {
        let mut acc = 0.0;
        self.values
            .iter()
            .map(|&r| {
                if r.is_finite() {
                    acc = (1.0 + acc) * (1.0 + r) - 1.0;
                }
                acc
            })
            .collect()
    }

    /// Total compounded return over the series.
    #[must_use]
    pub fn total_return(&self) -> f64 {
        self.cumulative().last().copied().unwrap_or(0.0)
    }
}

/// Aggregates a holding matrix and a returns panel into a daily
/// equal-weight portfolio return series.
///
/// Per date, the result is the sum of the held names' observed returns
/// divided by the held count; a held name with no observation that day
/// contributes a flat zero to the numerator but stays in the denominator.
/// A date with nothing held resolves per `policy`. The output index equals
/// the returns panel's calendar exactly.
///
/// No lookahead is introduced here: the holding state for a date was fully
/// determined by earlier information, and only same-day realized returns of
/// currently-held names enter the mean.
#[must_use]
pub fn portfolio_returns(
    holdings: &HoldingMatrix,
    returns: &DailyPanel,
    policy: EmptyPolicy,
) -> ReturnSeries {
    let dates: Vec<Date> = returns.calendar().dates().to_vec();
    let empty_value = match policy {
        EmptyPolicy::Zero => 0.0,
        EmptyPolicy::Undefined => f64::NAN,
    };

    let values: Vec<f64> = dates
        .iter()
        .map(|&date| {
            let Some(held) = holdings.held_on(date) else {
                return empty_value;
            };
            if held.is_empty() {
                return empty_value;
            }
            let mut sum = 0.0;
            for symbol in held {
                if let Some(r) = returns.value(date, symbol) {
                    sum += r;
                }
            }
            sum / held.len() as f64
        })
        .collect();

    ReturnSeries::new(dates, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use keelung_panel::TradingCalendar;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn returns_panel() -> DailyPanel {
        DailyPanel::from_observations(vec![
            (d(2021, 1, 4), "AAA".to_string(), 0.02),
            (d(2021, 1, 4), "BBB".to_string(), 0.04),
            (d(2021, 1, 5), "AAA".to_string(), 0.01),
        ])
    }

    #[test]
    fn test_equal_weight_mean() {
        let panel = returns_panel();
        let mut holdings = HoldingMatrix::empty(panel.calendar().clone());
        holdings.mark(d(2021, 1, 4), "AAA");
        holdings.mark(d(2021, 1, 4), "BBB");

        let series = portfolio_returns(&holdings, &panel, EmptyPolicy::Zero);
        assert_relative_eq!(series.values()[0], 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_policy_zero_vs_undefined() {
        let panel = returns_panel();
        let holdings = HoldingMatrix::empty(panel.calendar().clone());

        let zero = portfolio_returns(&holdings, &panel, EmptyPolicy::Zero);
        assert_eq!(zero.values(), &[0.0, 0.0]);

        let undef = portfolio_returns(&holdings, &panel, EmptyPolicy::Undefined);
        assert!(undef.values().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_output_index_matches_returns_calendar() {
        let panel = returns_panel();
        // Holdings carry a different (wider) calendar; the output index must
        // follow the returns panel regardless.
        let wide = TradingCalendar::new(vec![
            d(2021, 1, 4),
            d(2021, 1, 5),
            d(2021, 1, 6),
        ]);
        let mut holdings = HoldingMatrix::empty(wide);
        holdings.mark(d(2021, 1, 6), "AAA");

        let series = portfolio_returns(&holdings, &panel, EmptyPolicy::Zero);
        assert_eq!(series.dates(), panel.calendar().dates());
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_unobserved_held_name_stays_in_denominator() {
        let panel = returns_panel();
        let mut holdings = HoldingMatrix::empty(panel.calendar().clone());
        // BBB has no observation on Jan 5.
        holdings.mark(d(2021, 1, 5), "AAA");
        holdings.mark(d(2021, 1, 5), "BBB");

        let series = portfolio_returns(&holdings, &panel, EmptyPolicy::Zero);
        assert_relative_eq!(series.values()[1], 0.005, epsilon = 1e-12);
    }

    #[test]
    fn test_cumulative_compounds() {
        let series = ReturnSeries::new(
            vec![d(2021, 1, 4), d(2021, 1, 5)],
            vec![0.10, 0.10],
        );
        let cum = series.cumulative();
        assert_relative_eq!(cum[1], 0.21, epsilon = 1e-12);
        assert_relative_eq!(series.total_return(), 0.21, epsilon = 1e-12);
    }
}
