//! Reference periods and lenient date parsing
//!
//! Payments and invoices are filed against a calendar month. Dates arriving
//! from operators or the extraction service come in either ISO or Brazilian
//! day-first form.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors related to temporal values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid reference month {month}/{year}: month must be between 1 and 12")]
    InvalidMonth { month: u32, year: i32 },

    #[error("Unparseable date: {0}")]
    UnparseableDate(String),

    #[error("Unparseable timestamp: {0}")]
    UnparseableTimestamp(String),
}

/// The month a payment or invoice refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferencePeriod {
    year: i32,
    month: u32,
}

impl ReferencePeriod {
    /// Creates a period, rejecting months outside 1..=12
    pub fn new(month: u32, year: i32) -> Result<Self, TemporalError> {
        if !(1..=12).contains(&month) {
            return Err(TemporalError::InvalidMonth { month, year });
        }
        Ok(Self { year, month })
    }

    /// The period containing a date
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }
}

impl fmt::Display for ReferencePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Parses `YYYY-MM-DD` or `DD/MM/YYYY`
pub fn parse_date(text: &str) -> Result<NaiveDate, TemporalError> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .or_else(|_| {
            // timestamps exported by other tools carry a time part
            DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive())
        })
        .map_err(|_| TemporalError::UnparseableDate(text.to_string()))
}

/// Parses an RFC 3339 timestamp into UTC
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, TemporalError> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| TemporalError::UnparseableTimestamp(text.to_string()))
}

/// Formats a date the way backups store it
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Formats a timestamp the way backups store it
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reference_period_rejects_month_13() {
        assert_eq!(
            ReferencePeriod::new(13, 2025),
            Err(TemporalError::InvalidMonth { month: 13, year: 2025 })
        );
        assert!(ReferencePeriod::new(0, 2025).is_err());
    }

    #[test]
    fn test_reference_period_display() {
        assert_eq!(ReferencePeriod::new(3, 2025).unwrap().to_string(), "03/2025");
    }

    #[test]
    fn test_parse_date_both_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 10, 5).unwrap();
        assert_eq!(parse_date("2025-10-05").unwrap(), expected);
        assert_eq!(parse_date("05/10/2025").unwrap(), expected);
        assert!(parse_date("October 5").is_err());
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(ts)).unwrap(), ts);
    }
}
