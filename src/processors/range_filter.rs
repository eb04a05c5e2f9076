use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::models::Series;

/// Closed date interval. Construction orders the bounds, so an inverted pair
/// selects the same days as the ordered one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// The span from the first to the last observation of `series`.
    pub fn covering(series: &Series) -> Option<Self> {
        Some(Self::new(series.first_date()?, series.last_date()?))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days in the interval, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Observations of `series` dated within the interval, as a new series.
    pub fn filter(&self, series: &Series) -> Series {
        series.subset(|obs| self.contains(obs.date))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}
