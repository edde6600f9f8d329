//! Date-range splitting
//!
//! Broad queries hit the listing's per-query result cap long before they reach
//! old posts. Walking one day at a time sidesteps the cap and, combined with
//! chronological walks, yields posts oldest first across the whole interval.

use crate::search::DAY_FORMAT;
use crate::{DateError, DateResult};
use chrono::{Days, NaiveDate, Utc};
use std::fmt;

/// Earliest date the service has posts for
pub const EARLIEST_DATE: (i32, u32, u32) = (2006, 3, 21);

/// A half-open day interval `[since, until)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl DateRange {
    /// Number of calendar days covered
    pub fn days(&self) -> i64 {
        (self.until - self.since).num_days()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.since.format(DAY_FORMAT),
            self.until.format(DAY_FORMAT)
        )
    }
}

/// Lazily yields contiguous sub-ranges of `[since, until)`, oldest first
///
/// Every range spans `granularity` days except possibly the last, which is
/// clamped to `until`.
#[derive(Debug, Clone)]
pub struct DateRanges {
    next: NaiveDate,
    until: NaiveDate,
    step_days: u64,
}

impl DateRanges {
    /// Resolves open bounds and validates the interval
    ///
    /// A missing `since` means the service's earliest date, a missing `until`
    /// means today (UTC).
    pub fn new(
        since: Option<NaiveDate>,
        until: Option<NaiveDate>,
        granularity_days: u32,
    ) -> DateResult<Self> {
        let since = since.unwrap_or_else(earliest_date);
        let until = until.unwrap_or_else(|| Utc::now().date_naive());
        Self::between(since, until, granularity_days)
    }

    /// Creates ranges over an explicit interval
    pub fn between(since: NaiveDate, until: NaiveDate, granularity_days: u32) -> DateResult<Self> {
        if granularity_days == 0 {
            return Err(DateError::ZeroGranularity);
        }
        if since >= until {
            return Err(DateError::EmptyRange { since, until });
        }

        Ok(Self {
            next: since,
            until,
            step_days: u64::from(granularity_days),
        })
    }
}

impl Iterator for DateRanges {
    type Item = DateRange;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.until {
            return None;
        }

        let since = self.next;
        let until = since
            .checked_add_days(Days::new(self.step_days))
            .map_or(self.until, |end| end.min(self.until));
        self.next = until;

        Some(DateRange { since, until })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let days = (self.until - self.next).num_days().max(0) as u64;
        let remaining = days.div_ceil(self.step_days) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DateRanges {}

fn earliest_date() -> NaiveDate {
    let (y, m, d) = EARLIEST_DATE;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_two_day_split() {
        let ranges: Vec<_> = DateRanges::between(day(2015, 1, 6), day(2015, 1, 8), 1)
            .unwrap()
            .collect();
        assert_eq!(
            ranges,
            vec![
                DateRange {
                    since: day(2015, 1, 6),
                    until: day(2015, 1, 7)
                },
                DateRange {
                    since: day(2015, 1, 7),
                    until: day(2015, 1, 8)
                },
            ]
        );
        assert_eq!(ranges[0].to_string(), "[2015-01-06, 2015-01-07)");
    }

    #[test]
    fn test_ranges_are_contiguous_and_cover_interval() {
        let since = day(2015, 12, 20);
        let until = day(2016, 3, 2);
        let ranges: Vec<_> = DateRanges::between(since, until, 1).unwrap().collect();

        assert_eq!(ranges.len() as i64, (until - since).num_days());
        assert_eq!(ranges.first().unwrap().since, since);
        assert_eq!(ranges.last().unwrap().until, until);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].until, pair[1].since);
        }
        assert!(ranges.iter().all(|r| r.days() == 1));
    }

    #[test]
    fn test_final_partial_range_is_clamped() {
        let ranges: Vec<_> = DateRanges::between(day(2015, 1, 1), day(2015, 1, 8), 3)
            .unwrap()
            .collect();
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[2].since, day(2015, 1, 7));
        assert_eq!(ranges[2].until, day(2015, 1, 8));
        assert_eq!(ranges[2].days(), 1);
    }

    #[test]
    fn test_size_hint_matches_count() {
        let ranges = DateRanges::between(day(2015, 1, 1), day(2015, 1, 8), 3).unwrap();
        assert_eq!(ranges.len(), 3);

        let daily = DateRanges::between(day(2016, 2, 27), day(2016, 3, 2), 1).unwrap();
        assert_eq!(daily.len(), 4);
    }

    #[test]
    fn test_empty_or_inverted_interval_is_rejected() {
        assert!(matches!(
            DateRanges::between(day(2015, 1, 6), day(2015, 1, 6), 1),
            Err(DateError::EmptyRange { .. })
        ));
        assert!(matches!(
            DateRanges::between(day(2015, 1, 8), day(2015, 1, 6), 1),
            Err(DateError::EmptyRange { .. })
        ));
        assert!(matches!(
            DateRanges::between(day(2015, 1, 6), day(2015, 1, 8), 0),
            Err(DateError::ZeroGranularity)
        ));
    }

    #[test]
    fn test_open_bounds_use_service_defaults() {
        let mut ranges = DateRanges::new(None, Some(day(2006, 3, 23)), 1).unwrap();
        assert_eq!(ranges.next().unwrap().since, day(2006, 3, 21));

        let today = Utc::now().date_naive();
        let last = DateRanges::new(Some(today - Days::new(2)), None, 1)
            .unwrap()
            .last()
            .unwrap();
        assert_eq!(last.until, today);
    }
}
