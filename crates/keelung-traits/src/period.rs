//! Calendar periods with integer offset arithmetic.
//!
//! Decision rules reason about months and quarters, never raw dates:
//! a holding decision is anchored to a [`Month`] (or [`Quarter`]) and the
//! anti-lookahead offsets are plain integer arithmetic on these types.
//! Both types are totally ordered so period offsets preserve ordering.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A calendar month, totally ordered, supporting `month + n` arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Creates a month; `month` must be in `1..=12`.
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Option<Self> {
        if month >= 1 && month <= 12 {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Month of year, `1..=12`.
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Offsets this month by `n` months (negative moves backwards).
    #[must_use]
    pub const fn offset(self, n: i32) -> Self {
        let serial = self.year * 12 + (self.month as i32 - 1) + n;
        Self {
            year: serial.div_euclid(12),
            month: (serial.rem_euclid(12) + 1) as u32,
        }
    }

    /// The calendar quarter containing this month.
    #[must_use]
    pub const fn quarter(self) -> Quarter {
        Quarter {
            year: self.year,
            quarter: (self.month - 1) / 3 + 1,
        }
    }
}

impl Add<i32> for Month {
    type Output = Self;

    fn add(self, n: i32) -> Self {
        self.offset(n)
    }
}

impl Sub<i32> for Month {
    type Output = Self;

    fn sub(self, n: i32) -> Self {
        self.offset(-n)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A calendar quarter, totally ordered, supporting `quarter + n` arithmetic.
///
/// Beyond plain arithmetic, quarters know the reporting timeline used by
/// quarterly factors: when a quarter's statements are announced and when a
/// position based on them may first be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quarter {
    year: i32,
    quarter: u32,
}

impl Quarter {
    /// Creates a quarter; `quarter` must be in `1..=4`.
    #[must_use]
    pub const fn new(year: i32, quarter: u32) -> Option<Self> {
        if quarter >= 1 && quarter <= 4 {
            Some(Self { year, quarter })
        } else {
            None
        }
    }

    /// The calendar quarter containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Month::from_date(date).quarter()
    }

    /// Maps a statement announcement month to the quarter being reported.
    ///
    /// Q1 results arrive in April/May, Q2 in June through August, Q3 in
    /// September through November, and annual (Q4) figures from December
    /// through March of the following year.
    #[must_use]
    pub const fn from_announce_month(m: Month) -> Self {
        let (year, quarter) = match m.month() {
            4 | 5 => (m.year(), 1),
            6 | 7 | 8 => (m.year(), 2),
            9 | 10 | 11 => (m.year(), 3),
            12 => (m.year(), 4),
            _ => (m.year() - 1, 4),
        };
        Self { year, quarter }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Quarter of year, `1..=4`.
    #[must_use]
    pub const fn quarter(&self) -> u32 {
        self.quarter
    }

    /// Offsets this quarter by `n` quarters (negative moves backwards).
    #[must_use]
    pub const fn offset(self, n: i32) -> Self {
        let serial = self.year * 4 + (self.quarter as i32 - 1) + n;
        Self {
            year: serial.div_euclid(4),
            quarter: (serial.rem_euclid(4) + 1) as u32,
        }
    }

    /// The month in which a position based on this quarter's statements is
    /// entered: Q1 in June, Q2 in September, Q3 in December, Q4 in April of
    /// the following year (annual statements arrive latest).
    #[must_use]
    pub const fn entry_month(self) -> Month {
        match self.quarter {
            1 => Month {
                year: self.year,
                month: 6,
            },
            2 => Month {
                year: self.year,
                month: 9,
            },
            3 => Month {
                year: self.year,
                month: 12,
            },
            _ => Month {
                year: self.year + 1,
                month: 4,
            },
        }
    }

    /// The approximate statement announcement month, one month before
    /// [`entry_month`](Self::entry_month): Q1 in May, Q2 in August, Q3 in
    /// November, Q4 in March of the following year.
    #[must_use]
    pub const fn announce_month(self) -> Month {
        self.entry_month().offset(-1)
    }
}

impl Add<i32> for Quarter {
    type Output = Self;

    fn add(self, n: i32) -> Self {
        self.offset(n)
    }
}

impl Sub<i32> for Quarter {
    type Output = Self;

    fn sub(self, n: i32) -> Self {
        self.offset(-n)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}Q{}", self.year, self.quarter)
    }
}
