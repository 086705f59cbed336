//! Truncation to calendar boundaries and the day/week boundary shortcuts.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::anchor::{out_of_range, AnchoredInstant};
use crate::error::{AnchorError, Result};
use crate::temporal::{days_from_week_start, WeekStartDay};

/// The calendar field to truncate to. Every finer field is zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Granularity {
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

impl FromStr for Granularity {
    type Err = AnchorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "second" => Ok(Granularity::Second),
            "minute" => Ok(Granularity::Minute),
            "hour" => Ok(Granularity::Hour),
            "day" => Ok(Granularity::Day),
            "month" => Ok(Granularity::Month),
            "year" => Ok(Granularity::Year),
            _ => Err(AnchorError::InvalidTruncationLevel(format!("'{}'", s))),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Granularity::Second => "second",
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Month => "month",
            Granularity::Year => "year",
        })
    }
}

fn truncate_reading(reading: NaiveDateTime, level: Granularity) -> Option<NaiveDateTime> {
    let date = reading.date();
    let (h, m, s) = (reading.hour(), reading.minute(), reading.second());
    let (date, time) = match level {
        Granularity::Second => (date, NaiveTime::from_hms_opt(h, m, s)?),
        Granularity::Minute => (date, NaiveTime::from_hms_opt(h, m, 0)?),
        Granularity::Hour => (date, NaiveTime::from_hms_opt(h, 0, 0)?),
        Granularity::Day => (date, NaiveTime::MIN),
        Granularity::Month => (date.with_day(1)?, NaiveTime::MIN),
        Granularity::Year => (NaiveDate::from_ymd_opt(date.year(), 1, 1)?, NaiveTime::MIN),
    };
    Some(date.and_time(time))
}

impl AnchoredInstant {
    /// Zero every field finer than `level`, keeping the zone.
    ///
    /// If the truncated reading falls in a DST gap it rolls forward, the same
    /// way construction does.
    pub fn truncate(&self, level: Granularity) -> Result<Self> {
        let local = self.naive_local();
        let truncated = truncate_reading(local, level).ok_or_else(|| out_of_range(&local))?;
        self.relocalize(&truncated)
    }

    /// Truncate using a level name such as `"hour"`.
    ///
    /// # Errors
    ///
    /// Returns [`AnchorError::InvalidTruncationLevel`] for an unknown name.
    pub fn truncate_to(&self, level: &str) -> Result<Self> {
        self.truncate(level.parse()?)
    }

    /// Local midnight of the same day.
    pub fn midnight(&self) -> Result<Self> {
        self.truncate(Granularity::Day)
    }

    /// Alias for [`AnchoredInstant::midnight`].
    pub fn start_of_day(&self) -> Result<Self> {
        self.midnight()
    }

    /// The last microsecond of the same local day.
    pub fn end_of_day(&self) -> Result<Self> {
        let end = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
            .ok_or_else(|| out_of_range(&self.naive_local()))?;
        self.relocalize(&self.date().and_time(end))
    }

    /// Local midnight of the first day of the week containing this value.
    pub fn start_of_week(&self, week_start: WeekStartDay) -> Result<Self> {
        let date = self.date();
        let back = days_from_week_start(date.weekday(), week_start);
        let first = date
            .checked_sub_days(Days::new(back))
            .ok_or_else(|| out_of_range(&self.naive_local()))?;
        self.relocalize(&first.and_time(NaiveTime::MIN))
    }
}
