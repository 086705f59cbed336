//! Serializable views of anchored instants and the durations between them.
//!
//! - [`InstantSummary`]: UTC and local renderings of one instant, with
//!   offset and DST metadata, for formatters and JSON output
//! - [`DurationInfo`]: the signed span between two instants, split into
//!   whole days, hours, minutes and seconds
//! - [`WeekStartDay`]: which day begins a week for week boundaries and
//!   recurrence rules

use chrono::{SecondsFormat, TimeDelta, Weekday};
use serde::Serialize;

use crate::anchor::AnchoredInstant;

// ── Configurable week start ─────────────────────────────────────────────────

/// Which day begins a week for [`AnchoredInstant::start_of_week`] and for the
/// week numbering of recurrence rules.
///
/// Does **not** affect named-weekday shifts like "next Monday" or "last Friday".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum WeekStartDay {
    /// ISO 8601 standard (Monday = day 0 of the week).
    #[default]
    Monday,
    /// US/Canada convention (Sunday = day 0 of the week).
    Sunday,
}

impl WeekStartDay {
    pub fn weekday(self) -> Weekday {
        match self {
            WeekStartDay::Monday => Weekday::Mon,
            WeekStartDay::Sunday => Weekday::Sun,
        }
    }
}

/// How many days `weekday` is from the week-start day.
pub(crate) fn days_from_week_start(weekday: Weekday, week_start: WeekStartDay) -> u64 {
    match week_start {
        WeekStartDay::Monday => u64::from(weekday.num_days_from_monday()),
        WeekStartDay::Sunday => u64::from(weekday.num_days_from_sunday()),
    }
}

// ── InstantSummary ──────────────────────────────────────────────────────────

/// One instant rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstantSummary {
    /// The instant in UTC (RFC 3339, microseconds).
    pub utc: String,
    /// The instant in its own zone (RFC 3339 with offset, microseconds).
    pub local: String,
    /// The zone name, or `±HH:MM` for fixed offsets.
    pub timezone: String,
    /// The UTC offset at this instant (e.g., "-05:00").
    pub utc_offset: String,
    /// Whether Daylight Saving Time is active at this instant.
    pub dst_active: bool,
    /// Seconds since the Unix epoch.
    pub epoch: f64,
}

impl AnchoredInstant {
    /// Render this instant for display.
    ///
    /// ```
    /// use anchor_engine::AnchoredInstant;
    ///
    /// let v = AnchoredInstant::from_epoch(1_773_583_200.0).unwrap();
    /// let summary = v.shift_zone("America/New_York").unwrap().summary();
    /// assert_eq!(summary.utc_offset, "-04:00");
    /// assert!(summary.dst_active);
    /// ```
    pub fn summary(&self) -> InstantSummary {
        InstantSummary {
            utc: self.utc().to_rfc3339_opts(SecondsFormat::Micros, true),
            local: self.fixed().to_rfc3339_opts(SecondsFormat::Micros, false),
            timezone: self.zone().name(),
            utc_offset: format_offset_seconds(self.offset().local_minus_utc()),
            dst_active: self.is_dst(),
            epoch: self.epoch(),
        }
    }

    /// The span from `earlier` to `self`, split into whole units.
    pub fn duration_since(&self, earlier: &AnchoredInstant) -> DurationInfo {
        DurationInfo::between(earlier, self)
    }
}

// ── DurationInfo ────────────────────────────────────────────────────────────

/// A signed span of absolute time, split into whole units.
///
/// `total_seconds` carries the sign. The unit fields describe the magnitude,
/// with days of exactly 86 400 seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationInfo {
    pub total_seconds: i64,
    pub days: i64,
    /// 0-23
    pub hours: i64,
    /// 0-59
    pub minutes: i64,
    /// 0-59
    pub seconds: i64,
    /// 0-999999
    pub microseconds: i64,
}

impl DurationInfo {
    /// The span from `start` to `end`; negative if `end` comes first.
    pub fn between(start: &AnchoredInstant, end: &AnchoredInstant) -> Self {
        Self::from(end - start)
    }
}

impl From<TimeDelta> for DurationInfo {
    fn from(delta: TimeDelta) -> Self {
        let magnitude = delta.abs();
        DurationInfo {
            total_seconds: delta.num_seconds(),
            days: magnitude.num_days(),
            hours: magnitude.num_hours() % 24,
            minutes: magnitude.num_minutes() % 60,
            seconds: magnitude.num_seconds() % 60,
            microseconds: i64::from(magnitude.subsec_nanos() / 1_000),
        }
    }
}

// ── Formatting helpers ──────────────────────────────────────────────────────

/// Format a UTC offset in seconds as `±HH:MM`, or `±HH:MM:SS` when the
/// offset is not a whole number of minutes.
pub(crate) fn format_offset_seconds(offset_secs: i32) -> String {
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    let hours = abs_secs / 3600;
    let minutes = (abs_secs % 3600) / 60;
    let seconds = abs_secs % 60;
    if seconds == 0 {
        format!("{sign}{hours:02}:{minutes:02}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(rfc3339: &str) -> AnchoredInstant {
        let dt = chrono::DateTime::parse_from_rfc3339(rfc3339).unwrap();
        AnchoredInstant::from_aware(dt).unwrap()
    }

    // ── summary tests ───────────────────────────────────────────────────

    #[test]
    fn test_summary_eastern_winter() {
        let v = AnchoredInstant::from_aware(Utc.with_ymd_and_hms(2026, 1, 15, 15, 0, 0).unwrap())
            .unwrap()
            .shift_zone("America/New_York")
            .unwrap();
        let s = v.summary();
        assert_eq!(s.utc, "2026-01-15T15:00:00.000000Z");
        assert_eq!(s.local, "2026-01-15T10:00:00.000000-05:00");
        assert_eq!(s.timezone, "America/New_York");
        assert_eq!(s.utc_offset, "-05:00");
        assert!(!s.dst_active);
    }

    #[test]
    fn test_summary_fixed_offset() {
        let s = at("2026-06-01T12:00:00+05:30").summary();
        assert_eq!(s.timezone, "+05:30");
        assert_eq!(s.utc_offset, "+05:30");
        assert!(!s.dst_active);
    }

    #[test]
    fn test_summary_serializes() {
        let s = at("2013-01-03T04:31:14.148540Z").summary();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["timezone"], "+00:00");
        assert_eq!(json["utc"], "2013-01-03T04:31:14.148540Z");
        assert_eq!(json["dst_active"], false);
    }

    // ── duration tests ──────────────────────────────────────────────────

    #[test]
    fn test_duration_same_day() {
        let d = DurationInfo::between(&at("2026-03-16T09:00:00Z"), &at("2026-03-16T17:00:00Z"));
        assert_eq!(d.total_seconds, 28800);
        assert_eq!(d.hours, 8);
        assert_eq!(d.days, 0);
        assert_eq!(d.minutes, 0);
    }

    #[test]
    fn test_duration_across_zones() {
        // Friday 5pm in New York to Monday 9am in London.
        let start = at("2026-03-13T17:00:00-04:00");
        let end = at("2026-03-16T09:00:00+00:00");
        let d = end.duration_since(&start);
        assert_eq!(d.total_seconds, 2 * 86400 + 12 * 3600);
        assert_eq!(d.days, 2);
        assert_eq!(d.hours, 12);
    }

    #[test]
    fn test_duration_negative_direction() {
        let d = DurationInfo::between(&at("2026-03-16T17:00:00Z"), &at("2026-03-16T09:00:00Z"));
        assert_eq!(d.total_seconds, -28800);
        // Decomposition is always positive
        assert_eq!(d.hours, 8);
    }

    #[test]
    fn test_duration_keeps_sub_seconds() {
        let d = DurationInfo::between(
            &at("2026-03-16T00:00:00Z"),
            &at("2026-03-18T03:15:07.250000Z"),
        );
        assert_eq!(d.total_seconds, 184_507);
        assert_eq!((d.days, d.hours, d.minutes, d.seconds), (2, 3, 15, 7));
        assert_eq!(d.microseconds, 250_000);
    }

    #[test]
    fn test_duration_from_negative_delta() {
        let d = DurationInfo::from(TimeDelta::milliseconds(-90_500));
        assert_eq!(d.total_seconds, -90);
        assert_eq!((d.minutes, d.seconds, d.microseconds), (1, 30, 500_000));
    }

    // ── helper tests ────────────────────────────────────────────────────

    #[test]
    fn test_format_offset_seconds() {
        assert_eq!(format_offset_seconds(0), "+00:00");
        assert_eq!(format_offset_seconds(-18000), "-05:00");
        assert_eq!(format_offset_seconds(19800), "+05:30");
        assert_eq!(format_offset_seconds(-22500), "-06:15");
        assert_eq!(format_offset_seconds(3723), "+01:02:03");
    }

    #[test]
    fn test_days_from_week_start() {
        assert_eq!(days_from_week_start(Weekday::Mon, WeekStartDay::Monday), 0);
        assert_eq!(days_from_week_start(Weekday::Sun, WeekStartDay::Monday), 6);
        assert_eq!(days_from_week_start(Weekday::Sun, WeekStartDay::Sunday), 0);
        assert_eq!(days_from_week_start(Weekday::Sat, WeekStartDay::Sunday), 6);
    }
}
