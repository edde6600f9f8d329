//! Search date parsing and per-record cutoffs
//!
//! A search date always has day precision for the query itself. When the user
//! also gives a time of day, that instant becomes a strict cutoff evaluated
//! against every candidate record.

use crate::{DateError, DateResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Day layout used in queries and on the command line
pub const DAY_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d-%H:%M"];

/// A calendar day with an optional exact UTC instant on that day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchDate {
    pub day: NaiveDate,
    pub strict: Option<DateTime<Utc>>,
}

impl SearchDate {
    /// A date with day precision only
    pub fn day(day: NaiveDate) -> Self {
        Self { day, strict: None }
    }

    /// The exact cutoff when one was given, otherwise midnight UTC of the day
    pub fn instant(&self) -> DateTime<Utc> {
        self.strict
            .unwrap_or_else(|| self.day.and_time(NaiveTime::MIN).and_utc())
    }

    /// Parses `YYYY-MM-DD`, `YYYY-MM-DD HH:MM`, `YYYY-MM-DD-HH:MM` or
    /// `YYYY-MM-DD HH:MM:SS`, all interpreted as UTC
    pub fn parse(raw: &str) -> DateResult<Self> {
        let raw = raw.trim();

        for format in DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(Self {
                    day: naive.date(),
                    strict: Some(naive.and_utc()),
                });
            }
        }

        NaiveDate::parse_from_str(raw, DAY_FORMAT)
            .map(Self::day)
            .map_err(|_| DateError::Parse(raw.to_string()))
    }
}

impl FromStr for SearchDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SearchDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strict {
            Some(at) => write!(f, "{}", at.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, "{}", self.day.format(DAY_FORMAT)),
        }
    }
}

/// Exact time bounds applied to each candidate record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cutoffs {
    pub strictly_since: Option<DateTime<Utc>>,
    pub strictly_until: Option<DateTime<Utc>>,
}

impl Cutoffs {
    /// Returns true if a record created at `at` lies within both bounds (inclusive)
    pub fn admits(&self, at: DateTime<Utc>) -> bool {
        if matches!(self.strictly_since, Some(since) if at < since) {
            return false;
        }
        if matches!(self.strictly_until, Some(until) if at > until) {
            return false;
        }
        true
    }

    pub fn is_unbounded(&self) -> bool {
        self.strictly_since.is_none() && self.strictly_until.is_none()
    }
}
