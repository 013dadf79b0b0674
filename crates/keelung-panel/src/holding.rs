//! Daily 0/1 holding matrices produced by decision rules.

use std::collections::{BTreeMap, BTreeSet};

use keelung_traits::{Date, Month, Symbol};

use crate::TradingCalendar;

/// A daily holding indicator matrix: date -> set of held symbols.
///
/// Any (date, symbol) pair not present is implicitly 0. The date index is
/// the returns panel's calendar; a matrix with no marks at all is a valid
/// outcome (a factor that never found a qualifying cross-section).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldingMatrix {
    calendar: TradingCalendar,
    held: BTreeMap<Date, BTreeSet<Symbol>>,
}

impl HoldingMatrix {
    /// An all-zero matrix over `calendar`.
    #[must_use]
    pub const fn empty(calendar: TradingCalendar) -> Self {
        Self {
            calendar,
            held: BTreeMap::new(),
        }
    }

    /// The date index of this matrix.
    #[must_use]
    pub const fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    /// Marks `symbol` as held on `date`.
    pub fn mark(&mut self, date: Date, symbol: &str) {
        self.held
            .entry(date)
            .or_default()
            .insert(symbol.to_string());
    }

    /// Marks every symbol as held on every date.
    pub fn mark_days<S: AsRef<str>>(&mut self, dates: &[Date], symbols: &[S]) {
        for &date in dates {
            let row = self.held.entry(date).or_default();
            for s in symbols {
                row.insert(s.as_ref().to_string());
            }
        }
    }

    /// The set of symbols held on `date`, if any.
    #[must_use]
    pub fn held_on(&self, date: Date) -> Option<&BTreeSet<Symbol>> {
        self.held.get(&date)
    }

    /// Whether `symbol` is held on `date`.
    #[must_use]
    pub fn is_held(&self, date: Date, symbol: &str) -> bool {
        self.held.get(&date).is_some_and(|row| row.contains(symbol))
    }

    /// Number of symbols held on `date`.
    #[must_use]
    pub fn held_count(&self, date: Date) -> usize {
        self.held.get(&date).map_or(0, BTreeSet::len)
    }

    /// Whether no symbol is held on any date.
    #[must_use]
    pub fn is_all_zero(&self) -> bool {
        self.held.values().all(BTreeSet::is_empty)
    }

    /// The dates with at least one holding, ascending.
    #[must_use]
    pub fn active_dates(&self) -> Vec<Date> {
        self.held
            .iter()
            .filter(|(_, row)| !row.is_empty())
            .map(|(&d, _)| d)
            .collect()
    }

    /// The holding set at the last trading day of each month, for months
    /// where that set is non-empty.
    #[must_use]
    pub fn monthly_snapshot(&self) -> BTreeMap<Month, BTreeSet<Symbol>> {
        let mut out = BTreeMap::new();
        for month in self.calendar.months() {
            if let Some(date) = self.calendar.last_trading_day(month) {
                if let Some(row) = self.held.get(&date) {
                    if !row.is_empty() {
                        out.insert(month, row.clone());
                    }
                }
            }
        }
        out
    }
}
