//! Daily observation panels (returns, prices).

use std::collections::{BTreeMap, BTreeSet};

use keelung_traits::{Date, KeelungError, Month, Result, Symbol};
use polars::prelude::*;

use crate::TradingCalendar;

/// Days between 0001-01-01 (CE) and the 1970-01-01 epoch Polars dates use.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A sparse daily panel: (date, symbol) -> value.
///
/// Absence of a pair means "no observation", never zero. The panel owns the
/// [`TradingCalendar`] spanned by its observations; all month partitioning
/// and window slicing used by decision rules goes through that calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPanel {
    calendar: TradingCalendar,
    symbols: Vec<Symbol>,
    rows: BTreeMap<Date, BTreeMap<Symbol, f64>>,
}

impl DailyPanel {
    /// Builds a panel from in-memory observations.
    ///
    /// Non-finite values are treated as missing observations.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (Date, Symbol, f64)>,
    {
        let mut rows: BTreeMap<Date, BTreeMap<Symbol, f64>> = BTreeMap::new();
        let mut symbols: BTreeSet<Symbol> = BTreeSet::new();
        for (date, symbol, value) in observations {
            if !value.is_finite() {
                continue;
            }
            symbols.insert(symbol.clone());
            rows.entry(date).or_default().insert(symbol, value);
        }
        let calendar = TradingCalendar::new(rows.keys().copied().collect());
        Self {
            calendar,
            symbols: symbols.into_iter().collect(),
            rows,
        }
    }

    /// Builds a panel from a long-format DataFrame with columns `date`
    /// (date dtype), `symbol` (string) and `value_col` (numeric).
    ///
    /// # Errors
    ///
    /// Returns [`KeelungError::InvalidPanelIndex`] when the `date` column is
    /// not date-typed, and propagates Polars errors for missing or
    /// non-castable columns.
    pub fn from_long(df: &DataFrame, value_col: &str) -> Result<Self> {
        let date_col = df.column("date")?;
        let dates = date_col.date().map_err(|_| {
            KeelungError::InvalidPanelIndex(format!(
                "column 'date' has dtype {}, expected a date column",
                date_col.dtype()
            ))
        })?;
        let symbols = df.column("symbol")?.str()?;
        let values = df.column(value_col)?.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let mut observations = Vec::with_capacity(df.height());
        for ((d, s), v) in dates.into_iter().zip(symbols.into_iter()).zip(values) {
            if let (Some(d), Some(s), Some(v)) = (d, s, v) {
                let date = Date::from_num_days_from_ce_opt(d + EPOCH_DAYS_FROM_CE).ok_or_else(
                    || KeelungError::InvalidPanelIndex(format!("date value {d} out of range")),
                )?;
                observations.push((date, s.to_string(), v));
            }
        }
        Ok(Self::from_observations(observations))
    }

    /// The calendar spanned by this panel's observations.
    #[must_use]
    pub const fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    /// Sorted symbols with at least one observation.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Whether `symbol` has any observation.
    #[must_use]
    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols
            .binary_search_by(|s| s.as_str().cmp(symbol))
            .is_ok()
    }

    /// The observation at (date, symbol), if any.
    #[must_use]
    pub fn value(&self, date: Date, symbol: &str) -> Option<f64> {
        self.rows.get(&date).and_then(|row| row.get(symbol).copied())
    }

    /// All observations at `date`.
    #[must_use]
    pub fn row(&self, date: Date) -> Option<&BTreeMap<Symbol, f64>> {
        self.rows.get(&date)
    }

    /// Geometric compounded return over the trading days of `months`: the
    /// product of `1 + r` minus one, requiring at least one observation in
    /// the window.
    #[must_use]
    pub fn compound_return(&self, months: &[Month], symbol: &str) -> Option<f64> {
        let mut acc = 1.0;
        let mut seen = false;
        for &m in months {
            for &d in self.calendar.days_in_month(m) {
                if let Some(r) = self.value(d, symbol) {
                    acc *= 1.0 + r;
                    seen = true;
                }
            }
        }
        if seen { Some(acc - 1.0) } else { None }
    }

    /// Mean of the last `window` trading days' values ending at `date`.
    ///
    /// Requires the full window: `date` must have at least `window - 1`
    /// predecessors in the calendar and every day in the window must carry
    /// an observation.
    #[must_use]
    pub fn moving_average_at(&self, date: Date, symbol: &str, window: usize) -> Option<f64> {
        let pos = self.calendar.position(date)?;
        if window == 0 || pos + 1 < window {
            return None;
        }
        let dates = &self.calendar.dates()[pos + 1 - window..=pos];
        let mut sum = 0.0;
        for &d in dates {
            sum += self.value(d, symbol)?;
        }
        Some(sum / window as f64)
    }

    /// Simple return from the first to the last observation inside the
    /// inclusive date range `[start, end]`.
    ///
    /// Interior gaps are bridged (only the first and last observed values
    /// matter). `None` when the range holds no observation or the result is
    /// not finite.
    #[must_use]
    pub fn window_return(&self, start: Date, end: Date, symbol: &str) -> Option<f64> {
        let mut first = None;
        let mut last = None;
        for &d in self.calendar.range(start, end) {
            if let Some(v) = self.value(d, symbol) {
                if first.is_none() {
                    first = Some(v);
                }
                last = Some(v);
            }
        }
        let ret = (last? - first?) / first?;
        ret.is_finite().then_some(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Datelike;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn panel() -> DailyPanel {
        DailyPanel::from_observations(vec![
            (d(2021, 1, 4), "AAA".to_string(), 0.01),
            (d(2021, 1, 5), "AAA".to_string(), 0.02),
            (d(2021, 2, 1), "AAA".to_string(), -0.01),
            (d(2021, 1, 4), "BBB".to_string(), 0.03),
            (d(2021, 1, 5), "BBB".to_string(), f64::NAN),
        ])
    }

    #[test]
    fn test_sparse_lookup() {
        let p = panel();
        assert_eq!(p.value(d(2021, 1, 4), "AAA"), Some(0.01));
        // NaN input is a missing observation, not a stored value.
        assert_eq!(p.value(d(2021, 1, 5), "BBB"), None);
        assert_eq!(p.value(d(2021, 1, 6), "AAA"), None);
    }

    #[test]
    fn test_symbols_sorted() {
        let p = panel();
        assert_eq!(p.symbols(), &["AAA".to_string(), "BBB".to_string()]);
        assert!(p.has_symbol("AAA"));
        assert!(!p.has_symbol("CCC"));
    }

    #[test]
    fn test_compound_return_window_exact() {
        let p = panel();
        let jan = Month::new(2021, 1).unwrap();
        let feb = Month::new(2021, 2).unwrap();

        let jan_only = p.compound_return(&[jan], "AAA").unwrap();
        assert_relative_eq!(jan_only, 1.01 * 1.02 - 1.0, epsilon = 1e-12);

        // Widening the window changes the result: no day outside the
        // requested months may leak in.
        let jan_feb = p.compound_return(&[jan, feb], "AAA").unwrap();
        assert_relative_eq!(jan_feb, 1.01 * 1.02 * 0.99 - 1.0, epsilon = 1e-12);
        assert!((jan_only - jan_feb).abs() > 1e-6);
    }

    #[test]
    fn test_compound_return_requires_observation() {
        let p = panel();
        let mar = Month::new(2021, 3).unwrap();
        assert_eq!(p.compound_return(&[mar], "AAA"), None);
    }

    #[test]
    fn test_moving_average_needs_full_window() {
        let p = DailyPanel::from_observations(vec![
            (d(2021, 1, 4), "AAA".to_string(), 10.0),
            (d(2021, 1, 5), "AAA".to_string(), 11.0),
            (d(2021, 1, 6), "AAA".to_string(), 12.0),
        ]);
        assert_eq!(p.moving_average_at(d(2021, 1, 6), "AAA", 3), Some(11.0));
        assert_eq!(p.moving_average_at(d(2021, 1, 5), "AAA", 3), None);
    }

    #[test]
    fn test_moving_average_gap_breaks_window() {
        let p = DailyPanel::from_observations(vec![
            (d(2021, 1, 4), "AAA".to_string(), 10.0),
            (d(2021, 1, 5), "BBB".to_string(), 1.0),
            (d(2021, 1, 5), "AAA".to_string(), f64::NAN),
            (d(2021, 1, 6), "AAA".to_string(), 12.0),
        ]);
        assert_eq!(p.moving_average_at(d(2021, 1, 6), "AAA", 3), None);
    }

    #[test]
    fn test_window_return_bridges_gaps() {
        let p = DailyPanel::from_observations(vec![
            (d(2021, 1, 4), "AAA".to_string(), 100.0),
            (d(2021, 1, 6), "AAA".to_string(), 110.0),
        ]);
        let r = p.window_return(d(2021, 1, 4), d(2021, 1, 6), "AAA").unwrap();
        assert_relative_eq!(r, 0.10, epsilon = 1e-12);
        assert_eq!(p.window_return(d(2021, 2, 1), d(2021, 2, 5), "AAA"), None);
    }

    #[test]
    fn test_from_long_roundtrip() {
        let days: Vec<i32> = [d(2021, 1, 4), d(2021, 1, 5)]
            .iter()
            .map(|x| x.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
            .collect();
        let df = df! {
            "date" => days,
            "symbol" => &["AAA", "AAA"],
            "ret" => &[0.01, 0.02],
        }
        .unwrap();
        let df = df
            .lazy()
            .with_column(col("date").cast(DataType::Date))
            .collect()
            .unwrap();

        let p = DailyPanel::from_long(&df, "ret").unwrap();
        assert_eq!(p.value(d(2021, 1, 5), "AAA"), Some(0.02));
        assert_eq!(p.calendar().len(), 2);
    }

    #[test]
    fn test_from_long_rejects_non_date_index() {
        let df = df! {
            "date" => &["not-a-date"],
            "symbol" => &["AAA"],
            "ret" => &[0.01],
        }
        .unwrap();
        let err = DailyPanel::from_long(&df, "ret").unwrap_err();
        assert!(matches!(err, KeelungError::InvalidPanelIndex(_)));
    }
}
