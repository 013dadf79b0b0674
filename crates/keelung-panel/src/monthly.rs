//! Monthly factor panels: one cross-section per calendar month.

use std::collections::{BTreeMap, BTreeSet};

use keelung_traits::{Date, KeelungError, Month, Result, Symbol};
use polars::prelude::*;

/// Days between 0001-01-01 (CE) and the 1970-01-01 epoch Polars dates use.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A sparse monthly panel: (month, symbol) -> value.
///
/// One row per month. When a source DataFrame carries several observations
/// for the same (month, symbol), the chronologically last one wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyPanel {
    rows: BTreeMap<Month, BTreeMap<Symbol, f64>>,
}

impl MonthlyPanel {
    /// Builds a panel from in-memory observations; later duplicates win.
    ///
    /// Non-finite values are treated as missing observations.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (Month, Symbol, f64)>,
    {
        let mut rows: BTreeMap<Month, BTreeMap<Symbol, f64>> = BTreeMap::new();
        for (month, symbol, value) in observations {
            if !value.is_finite() {
                continue;
            }
            rows.entry(month).or_default().insert(symbol, value);
        }
        Self { rows }
    }

    /// Builds a panel from a long-format DataFrame with columns `date`,
    /// `symbol` and `value_col`.
    ///
    /// The `date` column may be date-typed (any day inside the month) or a
    /// string column of `YYYY-MM` periods.
    ///
    /// # Errors
    ///
    /// Returns [`KeelungError::InvalidPanelIndex`] when the index column is
    /// neither date-typed nor parseable as monthly periods.
    pub fn from_long(df: &DataFrame, value_col: &str) -> Result<Self> {
        let period_col = df.column("date")?;
        let symbols = df.column("symbol")?.str()?;
        let values = df.column(value_col)?.cast(&DataType::Float64)?;
        let values = values.f64()?;

        // (month, chronological key) pairs per row; the key orders duplicate
        // observations inside one month so the last one wins.
        let mut keyed: Vec<(Month, i64)> = Vec::with_capacity(df.height());
        match period_col.dtype() {
            DataType::Date => {
                let dates = period_col.date()?;
                for d in dates.into_iter() {
                    let d = d.ok_or_else(|| {
                        KeelungError::InvalidPanelIndex("null date in monthly index".to_string())
                    })?;
                    let date =
                        Date::from_num_days_from_ce_opt(d + EPOCH_DAYS_FROM_CE).ok_or_else(
                            || {
                                KeelungError::InvalidPanelIndex(format!(
                                    "date value {d} out of range"
                                ))
                            },
                        )?;
                    keyed.push((Month::from_date(date), i64::from(d)));
                }
            }
            DataType::String => {
                let periods = period_col.str()?;
                for p in periods.into_iter() {
                    let p = p.ok_or_else(|| {
                        KeelungError::InvalidPanelIndex("null period in monthly index".to_string())
                    })?;
                    let month = parse_month(p)?;
                    keyed.push((month, i64::from(month.year()) * 12 + i64::from(month.month())));
                }
            }
            other => {
                return Err(KeelungError::InvalidPanelIndex(format!(
                    "monthly index has dtype {other}, expected date or string periods"
                )));
            }
        }

        let mut triples: Vec<(Month, i64, Symbol, f64)> = Vec::with_capacity(df.height());
        for (((month, key), s), v) in keyed
            .into_iter()
            .zip(symbols.into_iter())
            .zip(values.into_iter())
        {
            if let (Some(s), Some(v)) = (s, v) {
                triples.push((month, key, s.to_string(), v));
            }
        }
        triples.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        Ok(Self::from_observations(
            triples.into_iter().map(|(m, _, s, v)| (m, s, v)),
        ))
    }

    /// The months carrying data, ascending.
    #[must_use]
    pub fn months(&self) -> Vec<Month> {
        self.rows.keys().copied().collect()
    }

    /// The cross-section at `month`, if any.
    #[must_use]
    pub fn row(&self, month: Month) -> Option<&BTreeMap<Symbol, f64>> {
        self.rows.get(&month)
    }

    /// The observation at (month, symbol), if any.
    #[must_use]
    pub fn value(&self, month: Month, symbol: &str) -> Option<f64> {
        self.rows.get(&month).and_then(|row| row.get(symbol).copied())
    }

    /// Sorted union of symbols across all months.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut set: BTreeSet<&Symbol> = BTreeSet::new();
        for row in self.rows.values() {
            set.extend(row.keys());
        }
        set.into_iter().cloned().collect()
    }

    /// Whether the panel carries no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parses a `YYYY-MM` period string.
fn parse_month(s: &str) -> Result<Month> {
    let invalid = || KeelungError::InvalidPanelIndex(format!("cannot parse '{s}' as a month"));
    let (y, m) = s.split_once('-').ok_or_else(invalid)?;
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let month: u32 = m.parse().map_err(|_| invalid())?;
    Month::new(year, month).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn m(y: i32, mo: u32) -> Month {
        Month::new(y, mo).unwrap()
    }

    #[test]
    fn test_from_observations_later_wins() {
        let p = MonthlyPanel::from_observations(vec![
            (m(2021, 1), "AAA".to_string(), 10.0),
            (m(2021, 1), "AAA".to_string(), 12.0),
        ]);
        assert_eq!(p.value(m(2021, 1), "AAA"), Some(12.0));
    }

    #[test]
    fn test_non_finite_is_missing() {
        let p = MonthlyPanel::from_observations(vec![(m(2021, 1), "AAA".to_string(), f64::NAN)]);
        assert_eq!(p.value(m(2021, 1), "AAA"), None);
        assert!(p.is_empty());
    }

    #[test]
    fn test_from_long_string_periods() {
        let df = df! {
            "date" => &["2021-01", "2021-02"],
            "symbol" => &["AAA", "AAA"],
            "pe" => &[15.0, 16.0],
        }
        .unwrap();
        let p = MonthlyPanel::from_long(&df, "pe").unwrap();
        assert_eq!(p.value(m(2021, 1), "AAA"), Some(15.0));
        assert_eq!(p.months(), vec![m(2021, 1), m(2021, 2)]);
    }

    #[test]
    fn test_from_long_dates_last_in_month_wins() {
        let days: Vec<i32> = [
            Date::from_ymd_opt(2021, 1, 29).unwrap(),
            Date::from_ymd_opt(2021, 1, 15).unwrap(),
        ]
        .iter()
        .map(|d| d.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
        .collect();
        let df = df! {
            "date" => days,
            "symbol" => &["AAA", "AAA"],
            "pe" => &[20.0, 15.0],
        }
        .unwrap();
        let df = df
            .lazy()
            .with_column(col("date").cast(DataType::Date))
            .collect()
            .unwrap();
        let p = MonthlyPanel::from_long(&df, "pe").unwrap();
        // The Jan 29 row is chronologically last even though it appears first.
        assert_eq!(p.value(m(2021, 1), "AAA"), Some(20.0));
    }

    #[test]
    fn test_from_long_rejects_numeric_index() {
        let df = df! {
            "date" => &[202101i64],
            "symbol" => &["AAA"],
            "pe" => &[15.0],
        }
        .unwrap();
        assert!(matches!(
            MonthlyPanel::from_long(&df, "pe").unwrap_err(),
            KeelungError::InvalidPanelIndex(_)
        ));
    }
}
