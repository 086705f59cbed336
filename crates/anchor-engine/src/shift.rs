//! Directional calendar shifts: "next day", "last month", "next friday".
//!
//! Second, minute and hour are fixed-duration units: the shift moves the
//! absolute instant, so "last hour" is always exactly 3600 seconds earlier
//! even when the wall clock jumps.
//!
//! Day and longer units work on the wall-clock reading in the value's own
//! zone and re-anchor the result in that zone, so "next day" keeps the local
//! hour across a DST transition even though the absolute distance is 23 or
//! 25 hours. Month and year shifts clip to the last valid day of the target
//! month. A reading that lands in a gap rolls forward, so a day or week shift
//! into a gap cannot be undone by the opposite shift.
//!
//! Named-weekday shifts move strictly: "next friday" from a Friday is the
//! Friday a week later. With `count > 1` the single-step resolution is
//! repeated, which lands on the first hit plus `count - 1` weeks.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDateTime, TimeDelta, Weekday};

use crate::anchor::{out_of_range, AnchoredInstant};
use crate::error::{AnchorError, Result};

// ── Direction ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Next,
    Last,
}

impl FromStr for Direction {
    type Err = AnchorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "next" => Ok(Direction::Next),
            "last" => Ok(Direction::Last),
            _ => Err(AnchorError::InvalidShiftDirection(format!("'{}'", s))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Next => "next",
            Direction::Last => "last",
        })
    }
}

// ── ShiftUnit ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
    /// A named day of the week.
    Weekday(Weekday),
}

impl ShiftUnit {
    pub fn is_weekday(&self) -> bool {
        matches!(self, ShiftUnit::Weekday(_))
    }
}

impl FromStr for ShiftUnit {
    type Err = AnchorError;

    /// Accepts singular or plural plain units and full weekday names,
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let unit = match s.trim().to_ascii_lowercase().as_str() {
            "second" | "seconds" => ShiftUnit::Second,
            "minute" | "minutes" => ShiftUnit::Minute,
            "hour" | "hours" => ShiftUnit::Hour,
            "day" | "days" => ShiftUnit::Day,
            "week" | "weeks" => ShiftUnit::Week,
            "month" | "months" => ShiftUnit::Month,
            "year" | "years" => ShiftUnit::Year,
            "monday" => ShiftUnit::Weekday(Weekday::Mon),
            "tuesday" => ShiftUnit::Weekday(Weekday::Tue),
            "wednesday" => ShiftUnit::Weekday(Weekday::Wed),
            "thursday" => ShiftUnit::Weekday(Weekday::Thu),
            "friday" => ShiftUnit::Weekday(Weekday::Fri),
            "saturday" => ShiftUnit::Weekday(Weekday::Sat),
            "sunday" => ShiftUnit::Weekday(Weekday::Sun),
            _ => return Err(AnchorError::InvalidShiftUnit(format!("'{}'", s))),
        };
        Ok(unit)
    }
}

impl fmt::Display for ShiftUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShiftUnit::Second => "second",
            ShiftUnit::Minute => "minute",
            ShiftUnit::Hour => "hour",
            ShiftUnit::Day => "day",
            ShiftUnit::Week => "week",
            ShiftUnit::Month => "month",
            ShiftUnit::Year => "year",
            ShiftUnit::Weekday(Weekday::Mon) => "monday",
            ShiftUnit::Weekday(Weekday::Tue) => "tuesday",
            ShiftUnit::Weekday(Weekday::Wed) => "wednesday",
            ShiftUnit::Weekday(Weekday::Thu) => "thursday",
            ShiftUnit::Weekday(Weekday::Fri) => "friday",
            ShiftUnit::Weekday(Weekday::Sat) => "saturday",
            ShiftUnit::Weekday(Weekday::Sun) => "sunday",
        };
        f.write_str(name)
    }
}

// ── ShiftSpec ───────────────────────────────────────────────────────────────

/// A validated shift request.
///
/// Parses from the verb form `<direction>_<unit>`, e.g. `next_friday` or
/// `last_month`, with a count of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShiftSpec {
    pub direction: Direction,
    pub unit: ShiftUnit,
    pub count: u32,
}

impl ShiftSpec {
    pub fn new(direction: Direction, unit: ShiftUnit) -> Self {
        Self {
            direction,
            unit,
            count: 1,
        }
    }

    pub fn times(mut self, count: u32) -> Self {
        self.count = count;
        self
    }
}

impl FromStr for ShiftSpec {
    type Err = AnchorError;

    fn from_str(s: &str) -> Result<Self> {
        let (direction, unit) = s
            .trim()
            .split_once('_')
            .ok_or_else(|| AnchorError::InvalidShiftUnit(format!("'{}' has no unit", s)))?;
        Ok(ShiftSpec::new(direction.parse()?, unit.parse()?))
    }
}

impl fmt::Display for ShiftSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.direction, self.unit)?;
        if self.count != 1 {
            write!(f, " x{}", self.count)?;
        }
        Ok(())
    }
}

// ── Shifting ────────────────────────────────────────────────────────────────

impl AnchoredInstant {
    /// Move `count` units in `direction`, keeping this value's zone.
    ///
    /// A plain-unit shift with `count == 0` returns the value unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AnchorError::InvalidShiftCount`] for a weekday shift with a
    /// count of zero, or [`AnchorError::OutOfRange`] if the result falls
    /// outside the supported calendar.
    ///
    /// ```
    /// use anchor_engine::{AnchoredInstant, Direction, ShiftUnit};
    /// use chrono::{NaiveDate, Weekday};
    ///
    /// let reading = NaiveDate::from_ymd_opt(2013, 1, 3).unwrap().and_hms_opt(4, 31, 14).unwrap();
    /// let v = AnchoredInstant::anchor(reading, "UTC").unwrap();
    /// let friday = v.shift(Direction::Next, ShiftUnit::Weekday(Weekday::Fri), 2).unwrap();
    /// assert_eq!(friday.date(), NaiveDate::from_ymd_opt(2013, 1, 11).unwrap());
    /// ```
    pub fn shift(&self, direction: Direction, unit: ShiftUnit, count: u32) -> Result<Self> {
        if count == 0 {
            if unit.is_weekday() {
                return Err(AnchorError::InvalidShiftCount(format!(
                    "a {} shift needs a count of at least 1",
                    unit
                )));
            }
            return Ok(*self);
        }

        let n = i64::from(count);
        let shifted = match unit {
            ShiftUnit::Second => self.shift_elapsed(direction, TimeDelta::try_seconds(n)),
            ShiftUnit::Minute => self.shift_elapsed(direction, TimeDelta::try_minutes(n)),
            ShiftUnit::Hour => self.shift_elapsed(direction, TimeDelta::try_hours(n)),
            ShiftUnit::Day => {
                self.shift_wall_clock(|r| shift_days(r, direction, u64::from(count)))
            }
            ShiftUnit::Week => {
                self.shift_wall_clock(|r| shift_days(r, direction, u64::from(count) * 7))
            }
            ShiftUnit::Month => self.shift_wall_clock(|r| shift_months(r, direction, count)),
            ShiftUnit::Year => {
                self.shift_wall_clock(|r| shift_months(r, direction, count.checked_mul(12)?))
            }
            ShiftUnit::Weekday(target) => self.shift_wall_clock(|r| {
                (0..count).try_fold(r, |current, _| step_to_weekday(current, direction, target))
            }),
        }?;
        log::trace!("{} {} x{}: {} -> {}", direction, unit, count, self, shifted);
        Ok(shifted)
    }

    /// Shift using string direction and unit names.
    pub fn shift_by(&self, direction: &str, unit: &str, count: u32) -> Result<Self> {
        self.shift(direction.parse()?, unit.parse()?, count)
    }

    /// Apply a parsed [`ShiftSpec`].
    pub fn apply(&self, spec: &ShiftSpec) -> Result<Self> {
        self.shift(spec.direction, spec.unit, spec.count)
    }

    /// Shift using the verb form, e.g. `shift_named("next_friday", 2)`.
    pub fn shift_named(&self, verb: &str, count: u32) -> Result<Self> {
        self.apply(&verb.parse::<ShiftSpec>()?.times(count))
    }

    /// One unit forward.
    pub fn next(&self, unit: ShiftUnit) -> Result<Self> {
        self.shift(Direction::Next, unit, 1)
    }

    /// One unit back.
    pub fn last(&self, unit: ShiftUnit) -> Result<Self> {
        self.shift(Direction::Last, unit, 1)
    }

    fn shift_elapsed(&self, direction: Direction, delta: Option<TimeDelta>) -> Result<Self> {
        let delta = delta.ok_or_else(|| out_of_range(&self.naive_local()))?;
        match direction {
            Direction::Next => self.checked_add(delta),
            Direction::Last => self.checked_sub(delta),
        }
    }

    /// Move the local reading with `step` and re-anchor it in this zone.
    fn shift_wall_clock<F>(&self, step: F) -> Result<Self>
    where
        F: FnOnce(NaiveDateTime) -> Option<NaiveDateTime>,
    {
        let local = self.naive_local();
        let moved = step(local).ok_or_else(|| out_of_range(&local))?;
        self.relocalize(&moved)
    }
}

fn shift_days(reading: NaiveDateTime, direction: Direction, days: u64) -> Option<NaiveDateTime> {
    match direction {
        Direction::Next => reading.checked_add_days(Days::new(days)),
        Direction::Last => reading.checked_sub_days(Days::new(days)),
    }
}

fn shift_months(
    reading: NaiveDateTime,
    direction: Direction,
    months: u32,
) -> Option<NaiveDateTime> {
    match direction {
        Direction::Next => reading.checked_add_months(Months::new(months)),
        Direction::Last => reading.checked_sub_months(Months::new(months)),
    }
}

/// The nearest `target` weekday strictly after (or before) `reading`'s date,
/// at the same time of day.
fn step_to_weekday(
    reading: NaiveDateTime,
    direction: Direction,
    target: Weekday,
) -> Option<NaiveDateTime> {
    let current = i64::from(reading.weekday().num_days_from_monday());
    let wanted = i64::from(target.num_days_from_monday());
    let gap = match direction {
        Direction::Next => (wanted - current + 7) % 7,
        Direction::Last => (current - wanted + 7) % 7,
    };
    let gap = if gap == 0 { 7 } else { gap };
    shift_days(reading, direction, gap as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::Zone;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn naive(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, us: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_micro_opt(h, mi, s, us)
            .unwrap()
    }

    fn base() -> AnchoredInstant {
        AnchoredInstant::anchor(naive(2013, 1, 3, 4, 31, 14, 148540), "UTC").unwrap()
    }

    fn at(reading: NaiveDateTime, zone: &str) -> AnchoredInstant {
        AnchoredInstant::anchor(reading, zone).unwrap()
    }

    const FRIDAY: ShiftUnit = ShiftUnit::Weekday(Weekday::Fri);

    // ── parsing ─────────────────────────────────────────────────────────

    #[test]
    fn test_parse_units_and_directions() {
        assert_eq!("next".parse::<Direction>().unwrap(), Direction::Next);
        assert_eq!("LAST".parse::<Direction>().unwrap(), Direction::Last);
        assert_eq!("days".parse::<ShiftUnit>().unwrap(), ShiftUnit::Day);
        assert_eq!("Friday".parse::<ShiftUnit>().unwrap(), FRIDAY);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(matches!(
            "previous".parse::<Direction>(),
            Err(AnchorError::InvalidShiftDirection(_))
        ));
        assert!(matches!(
            "fortnight".parse::<ShiftUnit>(),
            Err(AnchorError::InvalidShiftUnit(_))
        ));
        assert!(matches!(
            "fri".parse::<ShiftUnit>(),
            Err(AnchorError::InvalidShiftUnit(_))
        ));
    }

    #[test]
    fn test_parse_verb_form() {
        let spec: ShiftSpec = "next_friday".parse().unwrap();
        assert_eq!(spec, ShiftSpec::new(Direction::Next, FRIDAY));
        let spec: ShiftSpec = "last_month".parse().unwrap();
        assert_eq!(spec, ShiftSpec::new(Direction::Last, ShiftUnit::Month));
        assert_eq!(spec.times(3).to_string(), "last_month x3");

        assert!(matches!(
            "upcoming_friday".parse::<ShiftSpec>(),
            Err(AnchorError::InvalidShiftDirection(_))
        ));
        assert!(matches!(
            "next_fortnight".parse::<ShiftSpec>(),
            Err(AnchorError::InvalidShiftUnit(_))
        ));
        assert!(matches!(
            "tomorrow".parse::<ShiftSpec>(),
            Err(AnchorError::InvalidShiftUnit(_))
        ));
    }

    // ── weekday shifts ──────────────────────────────────────────────────

    #[test]
    fn test_next_friday() {
        let v = base().next(FRIDAY).unwrap();
        assert_eq!(v.naive_local(), naive(2013, 1, 4, 4, 31, 14, 148540));
        assert_eq!(v.zone(), Zone::UTC);
    }

    #[test]
    fn test_next_friday_twice() {
        let v = base().shift(Direction::Next, FRIDAY, 2).unwrap();
        assert_eq!(v.naive_local(), naive(2013, 1, 11, 4, 31, 14, 148540));
    }

    #[test]
    fn test_last_friday() {
        let v = base().last(FRIDAY).unwrap();
        assert_eq!(v.naive_local(), naive(2012, 12, 28, 4, 31, 14, 148540));
    }

    #[test]
    fn test_last_friday_twice() {
        let v = base().shift_named("last_friday", 2).unwrap();
        assert_eq!(v.naive_local(), naive(2012, 12, 21, 4, 31, 14, 148540));
    }

    #[test]
    fn test_weekday_from_same_weekday_moves_a_week() {
        let friday = at(naive(2013, 1, 4, 9, 0, 0, 0), "UTC");
        let next = friday.next(FRIDAY).unwrap();
        assert_eq!(next.date(), NaiveDate::from_ymd_opt(2013, 1, 11).unwrap());
        let last = friday.last(FRIDAY).unwrap();
        assert_eq!(last.date(), NaiveDate::from_ymd_opt(2012, 12, 28).unwrap());
    }

    #[test]
    fn test_weekday_zero_count_rejected() {
        let err = base().shift(Direction::Next, FRIDAY, 0).unwrap_err();
        assert!(matches!(err, AnchorError::InvalidShiftCount(_)));
    }

    // ── plain unit shifts ───────────────────────────────────────────────

    #[test]
    fn test_plain_units() {
        let v = base();
        let cases = [
            (ShiftUnit::Second, naive(2013, 1, 3, 4, 31, 15, 148540)),
            (ShiftUnit::Minute, naive(2013, 1, 3, 4, 32, 14, 148540)),
            (ShiftUnit::Hour, naive(2013, 1, 3, 5, 31, 14, 148540)),
            (ShiftUnit::Day, naive(2013, 1, 4, 4, 31, 14, 148540)),
            (ShiftUnit::Week, naive(2013, 1, 10, 4, 31, 14, 148540)),
            (ShiftUnit::Month, naive(2013, 2, 3, 4, 31, 14, 148540)),
            (ShiftUnit::Year, naive(2014, 1, 3, 4, 31, 14, 148540)),
        ];
        for (unit, expected) in cases {
            assert_eq!(v.next(unit).unwrap().naive_local(), expected, "next {unit}");
        }
    }

    #[test]
    fn test_last_units_with_count() {
        let v = base();
        assert_eq!(
            v.shift_by("last", "days", 3).unwrap().naive_local(),
            naive(2012, 12, 31, 4, 31, 14, 148540)
        );
        assert_eq!(
            v.shift_by("last", "hour", 5).unwrap().naive_local(),
            naive(2013, 1, 2, 23, 31, 14, 148540)
        );
    }

    #[test]
    fn test_zero_count_is_noop() {
        let v = base();
        assert_eq!(v.shift(Direction::Next, ShiftUnit::Month, 0).unwrap(), v);
    }

    #[test]
    fn test_month_clips_to_last_day() {
        let jan31 = at(naive(2013, 1, 31, 12, 0, 0, 0), "UTC").next(ShiftUnit::Month).unwrap();
        assert_eq!(jan31.naive_local(), naive(2013, 2, 28, 12, 0, 0, 0));
        let leap = at(naive(2016, 1, 31, 12, 0, 0, 0), "UTC").next(ShiftUnit::Month).unwrap();
        assert_eq!(leap.naive_local(), naive(2016, 2, 29, 12, 0, 0, 0));
        let mar31 = at(naive(2013, 3, 31, 12, 0, 0, 0), "UTC").last(ShiftUnit::Month).unwrap();
        assert_eq!(mar31.naive_local(), naive(2013, 2, 28, 12, 0, 0, 0));
    }

    #[test]
    fn test_year_clips_leap_day() {
        let feb29 = at(naive(2016, 2, 29, 0, 0, 0, 0), "UTC");
        let next = feb29.next(ShiftUnit::Year).unwrap();
        assert_eq!(next.naive_local(), naive(2017, 2, 28, 0, 0, 0, 0));
        assert_eq!(
            feb29.shift(Direction::Next, ShiftUnit::Year, 4).unwrap().naive_local(),
            naive(2020, 2, 29, 0, 0, 0, 0)
        );
    }

    #[test]
    fn test_invalid_strings() {
        let v = base();
        assert!(matches!(
            v.shift_by("back", "day", 1),
            Err(AnchorError::InvalidShiftDirection(_))
        ));
        assert!(matches!(
            v.shift_by("next", "decade", 1),
            Err(AnchorError::InvalidShiftUnit(_))
        ));
    }

    #[test]
    fn test_overflow_is_out_of_range() {
        let v = base();
        let err = v.shift(Direction::Next, ShiftUnit::Year, 1_000_000).unwrap_err();
        assert!(matches!(err, AnchorError::OutOfRange(_)));
    }

    // ── DST ─────────────────────────────────────────────────────────────

    #[test]
    fn test_next_day_keeps_wall_clock_across_dst() {
        // March 7, 2026 09:00 EST -> March 8, 2026 09:00 EDT (23 hours later).
        let v = at(naive(2026, 3, 7, 9, 0, 0, 0), "America/New_York");
        let next = v.next(ShiftUnit::Day).unwrap();
        assert_eq!(next.naive_local(), naive(2026, 3, 8, 9, 0, 0, 0));
        assert!(next.is_dst());
        assert_eq!((next - v).num_hours(), 23);
    }

    #[test]
    fn test_shift_into_gap_rolls_forward() {
        let v = at(naive(2026, 3, 7, 2, 30, 0, 0), "America/New_York");
        let next = v.next(ShiftUnit::Day).unwrap();
        assert_eq!(next.naive_local(), naive(2026, 3, 8, 3, 30, 0, 0));
    }

    #[test]
    fn test_next_day_into_fold_picks_earlier_occurrence() {
        // 01:30 on November 1, 2026 happens twice in New York.
        let v = at(naive(2026, 10, 31, 1, 30, 0, 0), "America/New_York");
        let next = v.next(ShiftUnit::Day).unwrap();
        assert_eq!(next.naive_local(), naive(2026, 11, 1, 1, 30, 0, 0));
        assert_eq!(next.offset().local_minus_utc(), -4 * 3600);
        assert!(next.is_dst());
        assert_eq!((next - v).num_hours(), 24);
    }

    #[test]
    fn test_last_minute_crosses_spring_forward() {
        // 03:00 EDT on March 8, 2026 directly follows 01:59:59 EST.
        let v = at(naive(2026, 3, 8, 3, 0, 0, 0), "America/New_York");
        let last = v.last(ShiftUnit::Minute).unwrap();
        assert_eq!(last.naive_utc(), naive(2026, 3, 8, 6, 59, 0, 0));
        assert_eq!(last.naive_local(), naive(2026, 3, 8, 1, 59, 0, 0));
        assert!(!last.is_dst());
        assert_eq!(v - last, TimeDelta::minutes(1));
    }

    #[test]
    fn test_last_hour_crosses_spring_forward() {
        let v = at(naive(2026, 3, 8, 3, 30, 0, 0), "America/New_York");
        let last = v.last(ShiftUnit::Hour).unwrap();
        assert_eq!(last.naive_utc(), naive(2026, 3, 8, 6, 30, 0, 0));
        assert_eq!(last.naive_local(), naive(2026, 3, 8, 1, 30, 0, 0));
        assert_eq!(v - last, TimeDelta::hours(1));
        assert_eq!(last.next(ShiftUnit::Hour).unwrap(), v);
    }

    #[test]
    fn test_hours_round_trip_through_fold() {
        // 06:30 UTC is the second 01:30 of the night, in EST.
        let utc = Utc.with_ymd_and_hms(2026, 11, 1, 6, 30, 0).unwrap();
        let v = AnchoredInstant::from_aware(utc)
            .unwrap()
            .shift_zone("America/New_York")
            .unwrap();
        assert_eq!(v.offset().local_minus_utc(), -5 * 3600);

        let next = v.next(ShiftUnit::Hour).unwrap();
        assert_eq!(next.naive_local(), naive(2026, 11, 1, 2, 30, 0, 0));
        let back = next.last(ShiftUnit::Hour).unwrap();
        assert_eq!(back, v);
        assert_eq!(back.offset().local_minus_utc(), -5 * 3600);

        let earlier = v.last(ShiftUnit::Hour).unwrap();
        assert_eq!(earlier.naive_local(), naive(2026, 11, 1, 1, 30, 0, 0));
        assert!(earlier.is_dst());
    }

    #[test]
    fn test_shift_keeps_fixed_zone() {
        let v = base().shift_zone("+05:30").unwrap();
        let next = v.next(ShiftUnit::Week).unwrap();
        assert_eq!(next.zone(), v.zone());
        assert_eq!((next - v).num_days(), 7);
    }
}
