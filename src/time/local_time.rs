use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Timelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

lazy_static! {
    static ref LOCAL_TIME_RE: Regex = Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").unwrap();
}

/// A validated `HH:MM` 24-hour wall-clock time, branded over a raw string.
///
/// The only way to build one is through [`LocalTime::parse`] or
/// [`LocalTime::from_minutes`]; no unvalidated value can exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocalTime(String);

impl LocalTime {
    /// Parses `"HH:MM"`, `"H:MM"`, an ISO datetime prefix (`"...THH:MM..."`),
    /// or a 12-hour `"h:MM AM/PM"` string, normalizing to `"HH:MM"`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();

        if LOCAL_TIME_RE.is_match(trimmed) {
            return Ok(LocalTime(trimmed.to_string()));
        }

        if let Some(normalized) = Self::try_normalize_short(trimmed) {
            return Ok(normalized);
        }

        if let Some(normalized) = Self::try_normalize_iso(trimmed) {
            return Ok(normalized);
        }

        if let Some(normalized) = Self::try_normalize_ampm(trimmed) {
            return Ok(normalized);
        }

        Err(Error::InvalidLocalTime(input.to_string()))
    }

    /// `"H:MM"` → `"0H:MM"`.
    fn try_normalize_short(input: &str) -> Option<Self> {
        let (h, m) = input.split_once(':')?;
        if h.len() == 1 && h.chars().all(|c| c.is_ascii_digit()) {
            let padded = format!("0{}:{}", h, m);
            if LOCAL_TIME_RE.is_match(&padded) {
                return Some(LocalTime(padded));
            }
        }
        None
    }

    /// `"2025-01-10T09:30:00Z"` (or any prefix containing `T` followed by `HH:MM`).
    fn try_normalize_iso(input: &str) -> Option<Self> {
        let after_t = input.split('T').nth(1)?;
        let candidate = &after_t[..after_t.len().min(5)];
        if LOCAL_TIME_RE.is_match(candidate) {
            return Some(LocalTime(candidate.to_string()));
        }
        None
    }

    /// `"9:30 AM"` / `"12:15 pm"`.
    fn try_normalize_ampm(input: &str) -> Option<Self> {
        let upper = input.to_ascii_uppercase();
        let (time_part, suffix) = if let Some(rest) = upper.strip_suffix("AM") {
            (rest.trim(), "AM")
        } else if let Some(rest) = upper.strip_suffix("PM") {
            (rest.trim(), "PM")
        } else {
            return None;
        };

        let (h_str, m_str) = time_part.split_once(':')?;
        let mut hour: u32 = h_str.trim().parse().ok()?;
        let minute: u32 = m_str.trim().parse().ok()?;
        if hour == 0 || hour > 12 || minute > 59 {
            return None;
        }

        if suffix == "AM" {
            if hour == 12 {
                hour = 0;
            }
        } else if hour != 12 {
            hour += 12;
        }

        Self::from_minutes((hour * 60 + minute) as i64).ok()
    }

    /// The wall-clock reading of `instant`, expressed as a `LocalTime`, using
    /// the process's local timezone offset.
    pub fn from_instant(instant: &DateTime<Utc>) -> Self {
        let local = instant.with_timezone(&chrono::Local);
        LocalTime(format!("{:02}:{:02}", local.hour(), local.minute()))
    }

    /// Builds from minutes-since-midnight, `0 <= m < 1440`.
    pub fn from_minutes(minutes: i64) -> Result<Self> {
        if !(0..1440).contains(&minutes) {
            return Err(Error::InvalidLocalTime(format!("{} minutes", minutes)));
        }
        let h = minutes / 60;
        let m = minutes % 60;
        Ok(LocalTime(format!("{:02}:{:02}", h, m)))
    }

    /// Minutes since midnight, `0..=1439`.
    pub fn to_minutes(&self) -> i64 {
        let (h, m) = self.0.split_once(':').expect("validated at construction");
        h.parse::<i64>().expect("validated") * 60 + m.parse::<i64>().expect("validated")
    }

    /// `addMinutes(t, n)`, wrapping modulo 1440 (1 day); negative `n` wraps backward.
    pub fn add_minutes(&self, n: i64) -> Self {
        let total = self.to_minutes() + n;
        let wrapped = total.rem_euclid(1440);
        Self::from_minutes(wrapped).expect("rem_euclid(1440) is always in range")
    }

    /// Minutes from `a` to `b`, same-day only (not overnight-aware).
    pub fn minutes_between(a: &LocalTime, b: &LocalTime) -> i64 {
        b.to_minutes() - a.to_minutes()
    }

    /// Membership test with overnight-range semantics: if `start > end`,
    /// membership is `t >= start || t <= end`.
    pub fn is_between(t: &LocalTime, start: &LocalTime, end: &LocalTime) -> bool {
        let (t, s, e) = (t.to_minutes(), start.to_minutes(), end.to_minutes());
        if s <= e { t >= s && t <= e } else { t >= s || t <= e }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for LocalTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LocalTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_minutes().cmp(&other.to_minutes())
    }
}

impl TryFrom<String> for LocalTime {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        LocalTime::parse(&value)
    }
}

impl From<LocalTime> for String {
    fn from(value: LocalTime) -> Self {
        value.0
    }
}
