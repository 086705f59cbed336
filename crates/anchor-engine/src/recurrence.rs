//! Recurring sequences of anchored instants ("stops").
//!
//! A [`RecurrenceSpec`] describes an RFC 5545 style rule: a frequency, an
//! interval, optional count/until bounds and the usual `BY*` refinements.
//! The rule is expanded with the `rrule` crate over floating wall-clock
//! readings and every reading is then anchored on its own in the
//! requested zone, so a daily 09:00 rule stays at 09:00 local time on both
//! sides of a DST transition.
//!
//! Start and until are wall-clock readings: passing an aware instant for
//! either is rejected with [`AnchorError::InvalidDatetimeInput`].
//!
//! Elements have whole-second resolution.
//!
//! Because each reading goes through the same fold/gap policy as
//! construction, sub-daily rules follow the wall clock rather than elapsed
//! time across a transition. An hourly rule on a fall-back night yields the
//! repeated hour only once, at its earlier (daylight) occurrence. On a
//! spring-forward night the missing hour rolls forward onto the next one, so
//! that instant appears twice in a row.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Month, NaiveDateTime, TimeZone, Timelike, Weekday};
use rrule::{NWeekday, RRule, RRuleSet};

use crate::anchor::{localize, out_of_range, AnchorEngine, AnchoredInstant, Clock};
use crate::error::{AnchorError, Result};
use crate::moment::Moment;
use crate::temporal::WeekStartDay;
use crate::zone::{Zone, ZoneProvider, ZoneRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Yearly,
    Monthly,
    Weekly,
    Daily,
    Hourly,
    Minutely,
    Secondly,
}

impl From<Frequency> for rrule::Frequency {
    fn from(freq: Frequency) -> Self {
        match freq {
            Frequency::Yearly => rrule::Frequency::Yearly,
            Frequency::Monthly => rrule::Frequency::Monthly,
            Frequency::Weekly => rrule::Frequency::Weekly,
            Frequency::Daily => rrule::Frequency::Daily,
            Frequency::Hourly => rrule::Frequency::Hourly,
            Frequency::Minutely => rrule::Frequency::Minutely,
            Frequency::Secondly => rrule::Frequency::Secondly,
        }
    }
}

impl FromStr for Frequency {
    type Err = AnchorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yearly" => Ok(Frequency::Yearly),
            "monthly" => Ok(Frequency::Monthly),
            "weekly" => Ok(Frequency::Weekly),
            "daily" => Ok(Frequency::Daily),
            "hourly" => Ok(Frequency::Hourly),
            "minutely" => Ok(Frequency::Minutely),
            "secondly" => Ok(Frequency::Secondly),
            _ => Err(AnchorError::InvalidRecurrence(format!(
                "unknown frequency '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Frequency::Yearly => "yearly",
            Frequency::Monthly => "monthly",
            Frequency::Weekly => "weekly",
            Frequency::Daily => "daily",
            Frequency::Hourly => "hourly",
            Frequency::Minutely => "minutely",
            Frequency::Secondly => "secondly",
        })
    }
}

/// A `BYDAY` entry: every occurrence of a weekday, or the nth one within
/// the period (negative counts from the end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeekdayRule {
    Every(Weekday),
    Nth(i16, Weekday),
}

impl From<WeekdayRule> for NWeekday {
    fn from(rule: WeekdayRule) -> Self {
        match rule {
            WeekdayRule::Every(day) => NWeekday::Every(day),
            WeekdayRule::Nth(n, day) => NWeekday::Nth(n, day),
        }
    }
}

impl From<Weekday> for WeekdayRule {
    fn from(day: Weekday) -> Self {
        WeekdayRule::Every(day)
    }
}

// ── RecurrenceSpec ──────────────────────────────────────────────────────────

/// What to generate. Built with chained setters:
///
/// ```
/// use anchor_engine::{stops, RecurrenceSpec};
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// let spec = RecurrenceSpec::monthly()
///     .by_month([1, 4, 7, 10])
///     .by_month_day([15])
///     .count(4)
///     .start(start)
///     .zone("Europe/Paris");
/// let days: Vec<u32> = stops(&spec)
///     .unwrap()
///     .iter()
///     .map(|v| chrono::Datelike::month(&v.unwrap().date()))
///     .collect();
/// assert_eq!(days, vec![1, 4, 7, 10]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceSpec {
    pub frequency: Frequency,
    pub interval: u16,
    pub count: Option<u32>,
    pub start: Option<Moment>,
    pub until: Option<Moment>,
    pub zone: ZoneRef,
    pub week_start: Option<WeekStartDay>,
    pub by_set_pos: Vec<i32>,
    pub by_month: Vec<u8>,
    pub by_month_day: Vec<i8>,
    pub by_year_day: Vec<i16>,
    pub by_week_no: Vec<i8>,
    pub by_weekday: Vec<WeekdayRule>,
    pub by_hour: Vec<u8>,
    pub by_minute: Vec<u8>,
    pub by_second: Vec<u8>,
}

impl RecurrenceSpec {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            count: None,
            start: None,
            until: None,
            zone: ZoneRef::Resolved(Zone::UTC),
            week_start: None,
            by_set_pos: Vec::new(),
            by_month: Vec::new(),
            by_month_day: Vec::new(),
            by_year_day: Vec::new(),
            by_week_no: Vec::new(),
            by_weekday: Vec::new(),
            by_hour: Vec::new(),
            by_minute: Vec::new(),
            by_second: Vec::new(),
        }
    }

    pub fn hourly() -> Self {
        Self::new(Frequency::Hourly)
    }

    pub fn daily() -> Self {
        Self::new(Frequency::Daily)
    }

    pub fn monthly() -> Self {
        Self::new(Frequency::Monthly)
    }

    pub fn yearly() -> Self {
        Self::new(Frequency::Yearly)
    }

    pub fn interval(mut self, interval: u16) -> Self {
        self.interval = interval;
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn start(mut self, start: impl Into<Moment>) -> Self {
        self.start = Some(start.into());
        self
    }

    /// Inclusive upper bound on generated readings.
    pub fn until(mut self, until: impl Into<Moment>) -> Self {
        self.until = Some(until.into());
        self
    }

    pub fn zone(mut self, zone: impl Into<ZoneRef>) -> Self {
        self.zone = zone.into();
        self
    }

    pub fn week_start(mut self, week_start: WeekStartDay) -> Self {
        self.week_start = Some(week_start);
        self
    }

    pub fn by_set_pos(mut self, positions: impl IntoIterator<Item = i32>) -> Self {
        self.by_set_pos = positions.into_iter().collect();
        self
    }

    /// Months as 1..=12.
    pub fn by_month(mut self, months: impl IntoIterator<Item = u8>) -> Self {
        self.by_month = months.into_iter().collect();
        self
    }

    pub fn by_month_day(mut self, days: impl IntoIterator<Item = i8>) -> Self {
        self.by_month_day = days.into_iter().collect();
        self
    }

    pub fn by_year_day(mut self, days: impl IntoIterator<Item = i16>) -> Self {
        self.by_year_day = days.into_iter().collect();
        self
    }

    pub fn by_week_no(mut self, weeks: impl IntoIterator<Item = i8>) -> Self {
        self.by_week_no = weeks.into_iter().collect();
        self
    }

    pub fn by_weekday<W: Into<WeekdayRule>>(mut self, days: impl IntoIterator<Item = W>) -> Self {
        self.by_weekday = days.into_iter().map(Into::into).collect();
        self
    }

    pub fn by_hour(mut self, hours: impl IntoIterator<Item = u8>) -> Self {
        self.by_hour = hours.into_iter().collect();
        self
    }

    pub fn by_minute(mut self, minutes: impl IntoIterator<Item = u8>) -> Self {
        self.by_minute = minutes.into_iter().collect();
        self
    }

    pub fn by_second(mut self, seconds: impl IntoIterator<Item = u8>) -> Self {
        self.by_second = seconds.into_iter().collect();
        self
    }

    fn rule(&self) -> Result<RRule<rrule::Unvalidated>> {
        if self.interval == 0 {
            return Err(AnchorError::InvalidRecurrence(
                "interval must be at least 1".to_string(),
            ));
        }

        let mut rule = RRule::new(self.frequency.into()).interval(self.interval);
        if let Some(count) = self.count {
            rule = rule.count(count);
        }
        if let Some(week_start) = self.week_start {
            rule = rule.week_start(week_start.weekday());
        }
        if !self.by_set_pos.is_empty() {
            rule = rule.by_set_pos(self.by_set_pos.clone());
        }
        if !self.by_month.is_empty() {
            let months = self
                .by_month
                .iter()
                .map(|&m| {
                    Month::try_from(m).map_err(|_| {
                        AnchorError::InvalidRecurrence(format!("month out of range: {m}"))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            rule = rule.by_month(&months);
        }
        if !self.by_month_day.is_empty() {
            rule = rule.by_month_day(self.by_month_day.clone());
        }
        if !self.by_year_day.is_empty() {
            rule = rule.by_year_day(self.by_year_day.clone());
        }
        if !self.by_week_no.is_empty() {
            rule = rule.by_week_no(self.by_week_no.clone());
        }
        if !self.by_weekday.is_empty() {
            rule = rule.by_weekday(self.by_weekday.iter().map(|&d| d.into()).collect());
        }
        if !self.by_hour.is_empty() {
            rule = rule.by_hour(self.by_hour.clone());
        }
        if !self.by_minute.is_empty() {
            rule = rule.by_minute(self.by_minute.clone());
        }
        if !self.by_second.is_empty() {
            rule = rule.by_second(self.by_second.clone());
        }
        Ok(rule)
    }
}

fn wall_clock(boundary: Option<&Moment>, which: &str) -> Result<Option<NaiveDateTime>> {
    match boundary {
        None => Ok(None),
        Some(Moment::Naive(naive)) => Ok(Some(*naive)),
        Some(Moment::Aware(dt)) => Err(AnchorError::InvalidDatetimeInput(format!(
            "{which} must be a naive datetime, got {}",
            dt.to_rfc3339()
        ))),
    }
}

// ── Stops ───────────────────────────────────────────────────────────────────

/// An expanded recurrence. Every call to [`Stops::iter`] starts over from
/// the first element.
///
/// Without a count or until bound the sequence is infinite.
#[derive(Debug, Clone)]
pub struct Stops {
    set: RRuleSet,
    zone: Zone,
    until: Option<NaiveDateTime>,
}

impl Stops {
    pub fn iter(&self) -> StopsIter<'_> {
        StopsIter {
            inner: Box::new((&self.set).into_iter()),
            zone: self.zone,
            until: self.until,
            done: false,
        }
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }
}

impl<'a> IntoIterator for &'a Stops {
    type Item = Result<AnchoredInstant>;
    type IntoIter = StopsIter<'a>;

    fn into_iter(self) -> StopsIter<'a> {
        self.iter()
    }
}

/// Iterator over the elements of [`Stops`]. Ends after the first error.
pub struct StopsIter<'a> {
    inner: Box<dyn Iterator<Item = DateTime<rrule::Tz>> + 'a>,
    zone: Zone,
    until: Option<NaiveDateTime>,
    done: bool,
}

impl Iterator for StopsIter<'_> {
    type Item = Result<AnchoredInstant>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let reading = self.inner.next()?.naive_utc();
        if self.until.is_some_and(|until| reading > until) {
            self.done = true;
            return None;
        }
        match localize(&reading, self.zone) {
            Ok(dt) => Some(Ok(AnchoredInstant::from_zoned(dt))),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<P: ZoneProvider, C: Clock> AnchorEngine<P, C> {
    /// Expand `spec` into a restartable sequence of anchored instants.
    ///
    /// Without a start the sequence begins at the current wall-clock
    /// reading in `spec.zone`.
    ///
    /// # Errors
    ///
    /// Returns [`AnchorError::InvalidDatetimeInput`] for an aware start or
    /// until, [`AnchorError::UnknownTimezone`] for an unresolvable zone, or
    /// [`AnchorError::InvalidRecurrence`] if the rule is rejected.
    pub fn stops(&self, spec: &RecurrenceSpec) -> Result<Stops> {
        let start = wall_clock(spec.start.as_ref(), "start")?;
        let until = wall_clock(spec.until.as_ref(), "until")?;
        let zone = self.resolve(&spec.zone)?;

        let start = match start {
            Some(start) => start,
            None => self.now_in(zone)?.naive_local(),
        };
        let start = start.with_nanosecond(0).ok_or_else(|| out_of_range(&start))?;

        // Readings are floating: expand in UTC and reinterpret each in `zone`.
        let dt_start = rrule::Tz::Tz(chrono_tz::Tz::UTC).from_utc_datetime(&start);
        let set = spec
            .rule()?
            .build(dt_start)
            .map_err(|e| AnchorError::InvalidRecurrence(e.to_string()))?;
        log::debug!("expanding {} in {}", set, zone);

        Ok(Stops { set, zone, until })
    }
}

/// Expand `spec` with the default engine. See [`AnchorEngine::stops`].
pub fn stops(spec: &RecurrenceSpec) -> Result<Stops> {
    AnchorEngine::new().stops(spec)
}
