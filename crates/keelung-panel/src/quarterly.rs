//! Quarterly factor panels and quarter alignment.
//!
//! Quarterly statement data arrives under several index conventions: real
//! dates, `YYYYQQ` year+quarter codes (`202001` through `202004`), or monthly
//! announcement rows. Alignment normalizes all of them to [`Quarter`]
//! periods; when several source rows land in one quarter, the
//! chronologically last one represents that quarter.

use std::collections::{BTreeMap, BTreeSet};

use keelung_traits::{Date, KeelungError, Month, Quarter, Result, Symbol};
use polars::prelude::*;

use crate::MonthlyPanel;

/// Days between 0001-01-01 (CE) and the 1970-01-01 epoch Polars dates use.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A sparse quarterly panel: (quarter, symbol) -> value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuarterlyPanel {
    rows: BTreeMap<Quarter, BTreeMap<Symbol, f64>>,
}

impl QuarterlyPanel {
    /// Builds a panel from in-memory observations; later duplicates win.
    ///
    /// Non-finite values are treated as missing observations.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (Quarter, Symbol, f64)>,
    {
        let mut rows: BTreeMap<Quarter, BTreeMap<Symbol, f64>> = BTreeMap::new();
        for (quarter, symbol, value) in observations {
            if !value.is_finite() {
                continue;
            }
            rows.entry(quarter).or_default().insert(symbol, value);
        }
        Self { rows }
    }

    /// Builds a panel from a long-format DataFrame with columns `period`,
    /// `symbol` and `value_col`.
    ///
    /// The `period` column may be date-typed (mapped to the calendar
    /// quarter), an integer or string year+quarter code (`202001`), or a
    /// `YYYY-MM-DD` string. Quarter codes `5..=12` are tolerated as month
    /// numbers and mapped to their calendar quarter.
    ///
    /// # Errors
    ///
    /// Returns [`KeelungError::InvalidPanelIndex`] when the index column
    /// cannot be interpreted as quarters.
    pub fn from_long(df: &DataFrame, value_col: &str) -> Result<Self> {
        let period_col = df.column("period")?;
        let symbols = df.column("symbol")?.str()?;
        let values = df.column(value_col)?.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let mut keyed: Vec<(Quarter, i64)> = Vec::with_capacity(df.height());
        match period_col.dtype() {
            DataType::Date => {
                let dates = period_col.date()?;
                for d in dates.into_iter() {
                    let d = d.ok_or_else(|| {
                        KeelungError::InvalidPanelIndex("null date in quarterly index".to_string())
                    })?;
                    let date =
                        Date::from_num_days_from_ce_opt(d + EPOCH_DAYS_FROM_CE).ok_or_else(
                            || {
                                KeelungError::InvalidPanelIndex(format!(
                                    "date value {d} out of range"
                                ))
                            },
                        )?;
                    keyed.push((Quarter::from_date(date), i64::from(d)));
                }
            }
            DataType::String => {
                let periods = period_col.str()?;
                for p in periods.into_iter() {
                    let p = p.ok_or_else(|| {
                        KeelungError::InvalidPanelIndex(
                            "null period in quarterly index".to_string(),
                        )
                    })?;
                    keyed.push(parse_quarter_key(p)?);
                }
            }
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => {
                let codes = period_col.cast(&DataType::Int64)?;
                let codes = codes.i64()?;
                for c in codes.into_iter() {
                    let c = c.ok_or_else(|| {
                        KeelungError::InvalidPanelIndex(
                            "null period in quarterly index".to_string(),
                        )
                    })?;
                    keyed.push((quarter_from_code(c)?, c));
                }
            }
            other => {
                return Err(KeelungError::InvalidPanelIndex(format!(
                    "quarterly index has dtype {other}, expected date, string or numeric periods"
                )));
            }
        }

        let mut triples: Vec<(Quarter, i64, Symbol, f64)> = Vec::with_capacity(df.height());
        for (((quarter, key), s), v) in keyed
            .into_iter()
            .zip(symbols.into_iter())
            .zip(values.into_iter())
        {
            if let (Some(s), Some(v)) = (s, v) {
                triples.push((quarter, key, s.to_string(), v));
            }
        }
        triples.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        Ok(Self::from_observations(
            triples.into_iter().map(|(q, _, s, v)| (q, s, v)),
        ))
    }

    /// Aligns a monthly panel of statement announcements to the reported
    /// quarters: April/May rows report Q1, June-August Q2, September-November
    /// Q3, December-March the previous Q4. Within one quarter, the latest
    /// announcement month wins per symbol.
    #[must_use]
    pub fn from_monthly_announcements(panel: &MonthlyPanel) -> Self {
        Self::align_monthly(panel, Quarter::from_announce_month)
    }

    /// Aligns a monthly panel to calendar quarters (January-March -> Q1 and
    /// so on), the latest month in each quarter winning per symbol.
    #[must_use]
    pub fn from_monthly_calendar(panel: &MonthlyPanel) -> Self {
        Self::align_monthly(panel, Month::quarter)
    }

    fn align_monthly(panel: &MonthlyPanel, map: impl Fn(Month) -> Quarter) -> Self {
        let mut rows: BTreeMap<Quarter, BTreeMap<Symbol, f64>> = BTreeMap::new();
        for month in panel.months() {
            let quarter = map(month);
            if let Some(row) = panel.row(month) {
                let target = rows.entry(quarter).or_default();
                for (symbol, &value) in row {
                    target.insert(symbol.clone(), value);
                }
            }
        }
        Self { rows }
    }

    /// The quarters carrying data, ascending.
    #[must_use]
    pub fn quarters(&self) -> Vec<Quarter> {
        self.rows.keys().copied().collect()
    }

    /// The cross-section at `quarter`, if any.
    #[must_use]
    pub fn row(&self, quarter: Quarter) -> Option<&BTreeMap<Symbol, f64>> {
        self.rows.get(&quarter)
    }

    /// The observation at (quarter, symbol), if any.
    #[must_use]
    pub fn value(&self, quarter: Quarter, symbol: &str) -> Option<f64> {
        self.rows
            .get(&quarter)
            .and_then(|row| row.get(symbol).copied())
    }

    /// Sorted union of symbols across all quarters.
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

/// Parses a string quarterly period: a `YYYYQQ` code or a `YYYY-MM-DD` date.
fn parse_quarter_key(s: &str) -> Result<(Quarter, i64)> {
    if let Ok(code) = s.parse::<i64>() {
        return Ok((quarter_from_code(code)?, code));
    }
    if let Ok(date) = Date::parse_from_str(s, "%Y-%m-%d") {
        use chrono::Datelike;
        return Ok((Quarter::from_date(date), i64::from(date.num_days_from_ce())));
    }
    Err(KeelungError::InvalidPanelIndex(format!(
        "cannot parse '{s}' as a quarter"
    )))
}

/// Interprets a `YYYYQQ` integer code: trailing `1..=4` is the quarter,
/// `5..=12` is tolerated as a month number.
fn quarter_from_code(code: i64) -> Result<Quarter> {
    let invalid =
        || KeelungError::InvalidPanelIndex(format!("cannot parse {code} as a quarter code"));
    let year = i32::try_from(code / 100).map_err(|_| invalid())?;
    let tail = u32::try_from(code % 100).map_err(|_| invalid())?;
    match tail {
        1..=4 => Quarter::new(year, tail).ok_or_else(invalid),
        5..=12 => Ok(Month::new(year, tail).ok_or_else(invalid)?.quarter()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(y: i32, mo: u32) -> Month {
        Month::new(y, mo).unwrap()
    }

    fn q(y: i32, qt: u32) -> Quarter {
        Quarter::new(y, qt).unwrap()
    }

    #[test]
    fn test_from_long_year_quarter_codes() {
        let df = df! {
            "period" => &[202001i64, 202002, 202003, 202004],
            "symbol" => &["AAA", "AAA", "AAA", "AAA"],
            "margin" => &[0.10, 0.12, 0.11, 0.14],
        }
        .unwrap();
        let p = QuarterlyPanel::from_long(&df, "margin").unwrap();
        assert_eq!(p.value(q(2020, 2), "AAA"), Some(0.12));
        assert_eq!(p.quarters().len(), 4);
    }

    #[test]
    fn test_from_long_month_code_fallback() {
        // Trailing 07 is not a quarter; it is tolerated as July -> Q3.
        let df = df! {
            "period" => &[202007i64],
            "symbol" => &["AAA"],
            "margin" => &[0.1],
        }
        .unwrap();
        let p = QuarterlyPanel::from_long(&df, "margin").unwrap();
        assert_eq!(p.value(q(2020, 3), "AAA"), Some(0.1));
    }

    #[test]
    fn test_from_long_rejects_garbage() {
        let df = df! {
            "period" => &["soon"],
            "symbol" => &["AAA"],
            "margin" => &[0.1],
        }
        .unwrap();
        assert!(matches!(
            QuarterlyPanel::from_long(&df, "margin").unwrap_err(),
            KeelungError::InvalidPanelIndex(_)
        ));
    }

    #[test]
    fn test_announcement_alignment() {
        let p = MonthlyPanel::from_observations(vec![
            (m(2021, 5), "AAA".to_string(), 0.10),  // Q1 announcement
            (m(2021, 8), "AAA".to_string(), 0.12),  // Q2 announcement
            (m(2022, 3), "AAA".to_string(), 0.15),  // 2021 Q4 announcement
        ]);
        let qp = QuarterlyPanel::from_monthly_announcements(&p);
        assert_eq!(qp.value(q(2021, 1), "AAA"), Some(0.10));
        assert_eq!(qp.value(q(2021, 2), "AAA"), Some(0.12));
        assert_eq!(qp.value(q(2021, 4), "AAA"), Some(0.15));
    }

    #[test]
    fn test_announcement_alignment_last_month_wins() {
        // June and August both report Q2; August is chronologically last.
        let p = MonthlyPanel::from_observations(vec![
            (m(2021, 6), "AAA".to_string(), 0.11),
            (m(2021, 8), "AAA".to_string(), 0.13),
        ]);
        let qp = QuarterlyPanel::from_monthly_announcements(&p);
        assert_eq!(qp.value(q(2021, 2), "AAA"), Some(0.13));
    }

    #[test]
    fn test_calendar_alignment() {
        let p = MonthlyPanel::from_observations(vec![
            (m(2021, 2), "AAA".to_string(), 1.0),
            (m(2021, 3), "AAA".to_string(), 2.0),
            (m(2021, 4), "AAA".to_string(), 3.0),
        ]);
        let qp = QuarterlyPanel::from_monthly_calendar(&p);
        assert_eq!(qp.value(q(2021, 1), "AAA"), Some(2.0));
        assert_eq!(qp.value(q(2021, 2), "AAA"), Some(3.0));
    }
}
