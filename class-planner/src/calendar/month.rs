/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Month arithmetic and date parsing helpers.
//!
//! Free functions and a small value type so they can be used and tested
//! independently of [`CalendarIndex`](super::CalendarIndex).

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Accepted input layouts for project dates, tried in order.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1 = January … 12 = December.
    pub month: u32,
}

impl YearMonth {
    /// Returns `None` unless `month` is in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse a `YYYY-MM` string such as `"2026-07"`.
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .ok()
            .map(Self::from_date)
    }

    /// The following month.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(self, other: YearMonth) -> i64 {
        (i64::from(other.year) - i64::from(self.year)) * 12 + i64::from(other.month)
            - i64::from(self.month)
    }

    /// Short label such as `Jul/26`.
    pub fn label(self) -> String {
        let name = MONTH_ABBREVIATIONS[(self.month as usize - 1) % 12];
        format!("{name}/{:02}", self.year.rem_euclid(100))
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parse a project date in `YYYY-MM-DD` or `DD/MM/YYYY` form.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_year_month() {
        assert_eq!(YearMonth::parse("2026-07"), YearMonth::new(2026, 7));
        assert_eq!(YearMonth::parse(" 2027-01 "), YearMonth::new(2027, 1));
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert_eq!(YearMonth::parse("2026-13"), None);
        assert_eq!(YearMonth::parse("Jul/26"), None);
        assert_eq!(YearMonth::parse(""), None);
    }

    #[test]
    fn new_rejects_month_out_of_range() {
        assert!(YearMonth::new(2026, 0).is_none());
        assert!(YearMonth::new(2026, 13).is_none());
    }

    #[test]
    fn next_rolls_over_the_year() {
        let dec = YearMonth::new(2026, 12).unwrap();
        assert_eq!(dec.next(), YearMonth::new(2027, 1).unwrap());
        let mar = YearMonth::new(2026, 3).unwrap();
        assert_eq!(mar.next(), YearMonth::new(2026, 4).unwrap());
    }

    #[test]
    fn months_until_is_signed() {
        let a = YearMonth::new(2026, 11).unwrap();
        let b = YearMonth::new(2027, 2).unwrap();
        assert_eq!(a.months_until(b), 3);
        assert_eq!(b.months_until(a), -3);
        assert_eq!(a.months_until(a), 0);
    }

    #[test]
    fn label_uses_short_month_and_two_digit_year() {
        assert_eq!(YearMonth::new(2026, 7).unwrap().label(), "Jul/26");
        assert_eq!(YearMonth::new(2030, 12).unwrap().label(), "Dec/30");
        assert_eq!(YearMonth::new(2026, 1).unwrap().to_string(), "2026-01");
    }

    #[test]
    fn parse_date_accepts_both_layouts() {
        let iso = parse_date("2026-01-15").unwrap();
        let dmy = parse_date("15/01/2026").unwrap();
        assert_eq!(iso, dmy);
        assert_eq!(YearMonth::from_date(iso), YearMonth::new(2026, 1).unwrap());
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("2026-02-30").is_none());
        assert!(parse_date("31-03-2026").is_none());
        assert!(parse_date("tomorrow").is_none());
    }
}
