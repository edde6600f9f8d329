//! A fully resolved search: options, date bounds and traversal mode

use crate::crawler::{DateRange, DateRanges};
use crate::search::dates::{Cutoffs, SearchDate, DAY_FORMAT};
use crate::search::options::SearchOptions;
use crate::search::request::SearchRequest;
use crate::{DateError, DateResult};
use chrono::{Days, NaiveDate};

/// Everything a pipeline run needs to know about what to search for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    pub options: SearchOptions,

    /// Lower bound as the user gave it (day plus optional exact time)
    pub since: Option<SearchDate>,

    /// Upper bound as the user gave it (day plus optional exact time)
    pub until: Option<SearchDate>,

    /// Walk one calendar day at a time, oldest first
    pub daily: bool,

    /// Buffer each walk and emit it in ascending creation order
    pub chronological: bool,
}

impl SearchSpec {
    /// Creates and validates a search specification
    ///
    /// Fails with [`DateError::EmptyRange`] when both bounds are given and the
    /// searched `since` day is not strictly before the searched `until` day, and
    /// in daily mode when the resolved range would be empty.
    pub fn new(
        options: SearchOptions,
        since: Option<SearchDate>,
        until: Option<SearchDate>,
        daily: bool,
        chronological: bool,
    ) -> DateResult<Self> {
        let spec = Self {
            options,
            since,
            until,
            daily,
            chronological,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Parses the textual date bounds and creates the specification
    pub fn parse(
        options: SearchOptions,
        since: Option<&str>,
        until: Option<&str>,
        daily: bool,
        chronological: bool,
    ) -> DateResult<Self> {
        let since = since.map(SearchDate::parse).transpose()?;
        let until = until.map(SearchDate::parse).transpose()?;
        Self::new(options, since, until, daily, chronological)
    }

    /// Checks the date bounds; see [`SearchSpec::new`]
    pub fn validate(&self) -> DateResult<()> {
        if let (Some(since), Some(until)) = (self.since_day(), self.until_day()) {
            if since >= until {
                return Err(DateError::EmptyRange { since, until });
            }
        }
        if let (Some(since), Some(until)) = (self.since, self.until) {
            if since.instant() >= until.instant() {
                return Err(DateError::EmptyRange {
                    since: since.day,
                    until: until.day,
                });
            }
        }
        if self.daily {
            self.date_ranges()?;
        }
        Ok(())
    }

    /// Day sent as `since:`
    pub fn since_day(&self) -> Option<NaiveDate> {
        self.since.map(|s| s.day)
    }

    /// Day sent as `until:`
    ///
    /// `until:` is exclusive on the listing, so an exact cutoff time pushes the
    /// searched day forward by one to keep the cutoff's own day in scope.
    pub fn until_day(&self) -> Option<NaiveDate> {
        self.until.map(|u| match u.strict {
            Some(_) => u.day.checked_add_days(Days::new(1)).unwrap_or(u.day),
            None => u.day,
        })
    }

    pub fn cutoffs(&self) -> Cutoffs {
        Cutoffs {
            strictly_since: self.since.and_then(|s| s.strict),
            strictly_until: self.until.and_then(|u| u.strict),
        }
    }

    /// Daily ranges covering the whole search, with service defaults for open bounds
    pub fn date_ranges(&self) -> DateResult<DateRanges> {
        DateRanges::new(self.since_day(), self.until_day(), 1)
    }

    /// Builds the listing request for the whole search, or for one sub-range of it
    pub fn request(&self, range: Option<&DateRange>) -> SearchRequest {
        let (since, until) = match range {
            Some(range) => (Some(range.since), Some(range.until)),
            None => (self.since_day(), self.until_day()),
        };

        let mut q = self.options.query_terms();
        if let Some(since) = since {
            q.push(format!("since:{}", since.format(DAY_FORMAT)));
        }
        if let Some(until) = until {
            q.push(format!("until:{}", until.format(DAY_FORMAT)));
        }

        SearchRequest::new(q.join(" "))
    }
}
