//! Trading calendar: the strictly ascending sequence of trading dates.
//!
//! Every daily structure in the engine (returns, prices, holding matrices)
//! is indexed by one calendar, and all month/window slicing goes through it.

use keelung_traits::{Date, Month};

/// A strictly ascending, de-duplicated sequence of trading dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradingCalendar {
    dates: Vec<Date>,
}

impl TradingCalendar {
    /// Builds a calendar from arbitrary dates; sorts and de-duplicates.
    #[must_use]
    pub fn new(mut dates: Vec<Date>) -> Self {
        dates.sort_unstable();
        dates.dedup();
        Self { dates }
    }

    /// All trading dates in ascending order.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Number of trading dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the calendar has no dates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First trading date, if any.
    #[must_use]
    pub fn first(&self) -> Option<Date> {
        self.dates.first().copied()
    }

    /// Last trading date, if any.
    #[must_use]
    pub fn last(&self) -> Option<Date> {
        self.dates.last().copied()
    }

    /// Position of an exact trading date.
    #[must_use]
    pub fn position(&self, date: Date) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Trading date at `index`.
    #[must_use]
    pub fn date_at(&self, index: usize) -> Option<Date> {
        self.dates.get(index).copied()
    }

    /// The distinct months covered by the calendar, ascending.
    #[must_use]
    pub fn months(&self) -> Vec<Month> {
        let mut months: Vec<Month> = Vec::new();
        for &d in &self.dates {
            let m = Month::from_date(d);
            if months.last() != Some(&m) {
                months.push(m);
            }
        }
        months
    }

    /// The trading dates falling inside `month` (possibly empty).
    #[must_use]
    pub fn days_in_month(&self, month: Month) -> &[Date] {
        let start = self.dates.partition_point(|d| Month::from_date(*d) < month);
        let end = self.dates.partition_point(|d| Month::from_date(*d) <= month);
        &self.dates[start..end]
    }

    /// The latest trading date within `month`.
    ///
    /// Returns `None` when the calendar has no dates in that month; callers
    /// skip the period rather than substituting a nearby date.
    #[must_use]
    pub fn last_trading_day(&self, month: Month) -> Option<Date> {
        self.days_in_month(month).last().copied()
    }

    /// The trading dates in the inclusive range `[start, end]`.
    #[must_use]
    pub fn range(&self, start: Date, end: Date) -> &[Date] {
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end);
        if lo >= hi { &[] } else { &self.dates[lo..hi] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample() -> TradingCalendar {
        TradingCalendar::new(vec![
            d(2021, 1, 4),
            d(2021, 1, 5),
            d(2021, 1, 29),
            d(2021, 2, 1),
            d(2021, 2, 26),
            d(2021, 4, 1),
        ])
    }

    #[test]
    fn test_sorted_and_deduped() {
        let cal = TradingCalendar::new(vec![d(2021, 1, 5), d(2021, 1, 4), d(2021, 1, 5)]);
        assert_eq!(cal.dates(), &[d(2021, 1, 4), d(2021, 1, 5)]);
    }

    #[test]
    fn test_months_skips_gaps() {
        let months = sample().months();
        assert_eq!(
            months,
            vec![
                Month::new(2021, 1).unwrap(),
                Month::new(2021, 2).unwrap(),
                Month::new(2021, 4).unwrap(),
            ]
        );
    }

    #[test]
    fn test_days_in_month() {
        let cal = sample();
        let jan = cal.days_in_month(Month::new(2021, 1).unwrap());
        assert_eq!(jan.len(), 3);
        assert!(cal.days_in_month(Month::new(2021, 3).unwrap()).is_empty());
    }

    #[test]
    fn test_last_trading_day() {
        let cal = sample();
        assert_eq!(
            cal.last_trading_day(Month::new(2021, 1).unwrap()),
            Some(d(2021, 1, 29))
        );
        // A month with no trading dates is absent, not an error.
        assert_eq!(cal.last_trading_day(Month::new(2021, 3).unwrap()), None);
    }

    #[test]
    fn test_range_inclusive() {
        let cal = sample();
        let r = cal.range(d(2021, 1, 5), d(2021, 2, 1));
        assert_eq!(r, &[d(2021, 1, 5), d(2021, 1, 29), d(2021, 2, 1)]);
        assert!(cal.range(d(2021, 5, 1), d(2021, 6, 1)).is_empty());
    }

    #[test]
    fn test_position() {
        let cal = sample();
        assert_eq!(cal.position(d(2021, 2, 1)), Some(3));
        assert_eq!(cal.position(d(2021, 2, 2)), None);
    }
}
