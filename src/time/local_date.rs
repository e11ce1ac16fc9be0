use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

lazy_static! {
    static ref LOCAL_DATE_RE: Regex =
        Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").unwrap();
}

/// A validated `YYYY-MM-DD` local calendar date, branded over a raw string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocalDate(String);

impl LocalDate {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let candidate = if let Some((date_part, _)) = trimmed.split_once('T') {
            date_part
        } else {
            trimmed
        };

        if LOCAL_DATE_RE.is_match(candidate) && NaiveDate::parse_from_str(candidate, "%Y-%m-%d").is_ok() {
            return Ok(LocalDate(candidate.to_string()));
        }

        Err(Error::InvalidLocalDate(input.to_string()))
    }

    /// The local calendar date of `instant`, using the process's local timezone.
    pub fn from_instant(instant: &DateTime<Utc>) -> Self {
        let local = instant.with_timezone(&chrono::Local);
        LocalDate(format!(
            "{:04}-{:02}-{:02}",
            local.year(),
            local.month(),
            local.day()
        ))
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        LocalDate(format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day()))
    }

    pub fn to_naive(&self) -> NaiveDate {
        NaiveDate::parse_from_str(&self.0, "%Y-%m-%d").expect("validated at construction")
    }

    /// The next calendar day.
    pub fn next_day(&self) -> Self {
        Self::from_naive(self.to_naive() + chrono::Duration::days(1))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for LocalDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LocalDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl TryFrom<String> for LocalDate {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        LocalDate::parse(&value)
    }
}

impl From<LocalDate> for String {
    fn from(value: LocalDate) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_form() {
        assert_eq!(LocalDate::parse("2025-01-10").unwrap().as_str(), "2025-01-10");
    }

    #[test]
    fn parses_iso_datetime_prefix() {
        assert_eq!(
            LocalDate::parse("2025-01-10T09:00:00Z").unwrap().as_str(),
            "2025-01-10"
        );
    }

    #[test]
    fn rejects_invalid_calendar_date() {
        assert!(LocalDate::parse("2025-02-30").is_err());
        assert!(LocalDate::parse("2025-13-01").is_err());
        assert!(LocalDate::parse("not a date").is_err());
    }

    #[test]
    fn round_trips() {
        let d = LocalDate::parse("2025-12-31").unwrap();
        assert_eq!(LocalDate::parse(d.as_str()).unwrap(), d);
    }

    #[test]
    fn next_day_rolls_over_month_and_year() {
        assert_eq!(
            LocalDate::parse("2025-01-31").unwrap().next_day().as_str(),
            "2025-02-01"
        );
        assert_eq!(
            LocalDate::parse("2025-12-31").unwrap().next_day().as_str(),
            "2026-01-01"
        );
    }

    #[test]
    fn ordering_is_lexicographic_and_chronological() {
        assert!(LocalDate::parse("2025-01-10").unwrap() < LocalDate::parse("2025-02-01").unwrap());
    }
}
