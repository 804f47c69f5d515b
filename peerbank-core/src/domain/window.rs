//! Reporting window: the `(start, end)` date range that keys every fetch and cache entry.

use crate::data::provider::DataError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire format for report dates.
pub const REPORT_DATE_FORMAT: &str = "%Y%m%d";

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DataError> {
        if start > end {
            return Err(DataError::InvalidWindow(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse both ends from `YYYYMMDD` or `YYYY-MM-DD`.
    pub fn parse(start: &str, end: &str) -> Result<Self, DataError> {
        Self::new(parse_report_date(start)?, parse_report_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Start date in wire format.
    pub fn start_key(&self) -> String {
        self.start.format(REPORT_DATE_FORMAT).to_string()
    }

    /// End date in wire format.
    pub fn end_key(&self) -> String {
        self.end.format(REPORT_DATE_FORMAT).to_string()
    }

    /// Composite cache key `{start}_{end}`. Exact match only.
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.start_key(), self.end_key())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Calendar quarter-end dates (Mar 31, Jun 30, Sep 30, Dec 31) inside the window.
    pub fn quarter_ends(&self) -> Vec<NaiveDate> {
        let mut out = Vec::new();
        let mut year = self.start.year();
        let mut quarter = (self.start.month0() / 3) + 1;
        loop {
            let qe = quarter_end(year, quarter);
            if qe > self.end {
                break;
            }
            if qe >= self.start {
                out.push(qe);
            }
            if quarter == 4 {
                quarter = 1;
                year += 1;
            } else {
                quarter += 1;
            }
        }
        out
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_key(), self.end_key())
    }
}

/// Parse a report date from `YYYYMMDD` or `YYYY-MM-DD`.
pub fn parse_report_date(s: &str) -> Result<NaiveDate, DataError> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, REPORT_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .map_err(|e| DataError::InvalidWindow(format!("invalid date '{s}': {e}")))
}

fn quarter_end(year: i32, quarter: u32) -> NaiveDate {
    let (month, day) = match quarter {
        1 => (3, 31),
        2 => (6, 30),
        3 => (9, 30),
        _ => (12, 31),
    };
    // Every (month, day) above is a valid calendar date in any year.
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_both_formats() {
        let w = DateWindow::parse("20000331", "2025-03-31").unwrap();
        assert_eq!(w.start(), d(2000, 3, 31));
        assert_eq!(w.end(), d(2025, 3, 31));
        assert_eq!(w.cache_key(), "20000331_20250331");
    }

    #[test]
    fn rejects_inverted_window() {
        assert!(DateWindow::parse("20250101", "20240101").is_err());
        assert!(DateWindow::parse("2025-13-01", "20251231").is_err());
    }

    #[test]
    fn quarter_ends_are_inclusive() {
        let w = DateWindow::parse("20230331", "20240331").unwrap();
        let q = w.quarter_ends();
        assert_eq!(
            q,
            vec![
                d(2023, 3, 31),
                d(2023, 6, 30),
                d(2023, 9, 30),
                d(2023, 12, 31),
                d(2024, 3, 31)
            ]
        );
    }

    #[test]
    fn quarter_ends_skip_partial_quarters() {
        let w = DateWindow::parse("20230401", "20230929").unwrap();
        assert_eq!(w.quarter_ends(), vec![d(2023, 6, 30)]);
        let empty = DateWindow::parse("20230401", "20230415").unwrap();
        assert!(empty.quarter_ends().is_empty());
    }

    #[test]
    fn display_uses_wire_format() {
        let w = DateWindow::parse("20200101", "20201231").unwrap();
        assert_eq!(w.to_string(), "20200101 to 20201231");
    }
}
