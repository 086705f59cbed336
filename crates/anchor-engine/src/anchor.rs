//! The anchored instant value type and the anchor engine that builds it.
//!
//! Every [`AnchoredInstant`] comes out of [`AnchorEngine::anchor`] or out of
//! [`localize`], so the same rules apply to construction and to the results
//! of shifting, truncating and field replacement.
//!
//! # Anchoring rules
//!
//! | instant | zone | result                                              |
//! |---------|------|-----------------------------------------------------|
//! | absent  | none | now, in UTC                                         |
//! | absent  | any  | now, re-expressed in the zone                       |
//! | naive   | none | [`AnchorError::MissingTimezone`]                    |
//! | aware   | none | the instant with its embedded zone                  |
//! | naive   | any  | the clock reading interpreted in the zone           |
//! | aware   | any  | the instant with its embedded zone (zone validated) |
//!
//! # Folds and gaps
//!
//! A clock reading that occurs twice (a fold) resolves to the earlier
//! occurrence. A reading that never occurs (a gap) is interpreted with the
//! offset in force before the transition, which moves it forward by the
//! length of the gap: `02:30` on a spring-forward night in New York becomes
//! `03:30` EDT.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Sub;

use chrono::{
    DateTime, Datelike, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    SecondsFormat, TimeDelta, TimeZone, Timelike, Utc,
};

use crate::error::{AnchorError, Result};
use crate::moment::Moment;
use crate::zone::{Tzdb, Zone, ZoneOffset, ZoneProvider, ZoneRef};

// ── Clock ───────────────────────────────────────────────────────────────────

/// A source of the current instant and of the host's zone.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// The zone the host presents local time in.
    ///
    /// The default reads the operating system setting through
    /// `iana-time-zone`.
    fn local_zone(&self) -> Result<ZoneRef> {
        iana_time_zone::get_timezone()
            .map(ZoneRef::Name)
            .map_err(|e| AnchorError::UnknownTimezone(format!("system zone: {e}")))
    }
}

/// Reads the operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ── AnchorEngine ────────────────────────────────────────────────────────────

/// Builds anchored instants from candidate instants and zone references.
///
/// The engine owns its collaborators: a [`ZoneProvider`] for zone names and
/// a [`Clock`] for "now". [`AnchorEngine::new`] uses the compiled IANA
/// database and the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorEngine<P = Tzdb, C = SystemClock> {
    provider: P,
    clock: C,
}

impl AnchorEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: ZoneProvider, C: Clock> AnchorEngine<P, C> {
    pub fn with_parts(provider: P, clock: C) -> Self {
        Self { provider, clock }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Resolve a zone reference through this engine's provider.
    pub fn resolve(&self, zone: &ZoneRef) -> Result<Zone> {
        zone.resolve_with(&self.provider)
    }

    /// Anchor a candidate instant, applying the rules in the module docs.
    ///
    /// # Errors
    ///
    /// Returns [`AnchorError::MissingTimezone`] for a naive instant without a
    /// zone, or [`AnchorError::UnknownTimezone`] if the zone cannot be resolved.
    pub fn anchor(
        &self,
        instant: Option<Moment>,
        zone: Option<ZoneRef>,
    ) -> Result<AnchoredInstant> {
        match (instant, zone) {
            (None, None) => Ok(self.now()),
            (None, Some(zone)) => {
                let zone = self.resolve(&zone)?;
                Ok(AnchoredInstant::from_utc(self.clock.now(), zone))
            }
            (Some(Moment::Naive(_)), None) => Err(AnchorError::MissingTimezone),
            (Some(Moment::Aware(dt)), None) => Ok(AnchoredInstant { dt }),
            (Some(Moment::Naive(naive)), Some(zone)) => {
                let zone = self.resolve(&zone)?;
                localize(&naive, zone).map(|dt| AnchoredInstant { dt })
            }
            (Some(Moment::Aware(dt)), Some(zone)) => {
                let requested = self.resolve(&zone)?;
                if requested != dt.timezone() {
                    log::debug!(
                        "instant {} is already aware; ignoring requested zone {}",
                        dt.to_rfc3339(),
                        requested
                    );
                }
                Ok(AnchoredInstant { dt })
            }
        }
    }

    /// Anchor the output of a date-string parser: a clock reading, the offset
    /// the parser found (if any), and an optional zone hint.
    ///
    /// A parsed offset makes the instant aware, so it wins over the hint just
    /// as it would in [`AnchorEngine::anchor`].
    pub fn anchor_parsed(
        &self,
        reading: NaiveDateTime,
        offset: Option<FixedOffset>,
        zone: Option<ZoneRef>,
    ) -> Result<AnchoredInstant> {
        let moment = match offset {
            Some(offset) => {
                let zone = Zone::Fixed(offset);
                let dt = zone
                    .from_local_datetime(&reading)
                    .single()
                    .ok_or_else(|| out_of_range(&reading))?;
                Moment::Aware(dt)
            }
            None => Moment::Naive(reading),
        };
        self.anchor(Some(moment), zone)
    }

    /// The current instant in UTC.
    pub fn now(&self) -> AnchoredInstant {
        AnchoredInstant::from_utc(self.clock.now(), Zone::UTC)
    }

    /// The current instant, presented in `zone`.
    pub fn now_in(&self, zone: impl Into<ZoneRef>) -> Result<AnchoredInstant> {
        self.anchor(None, Some(zone.into()))
    }

    /// The current instant, presented in the clock's local zone.
    ///
    /// # Errors
    ///
    /// Returns [`AnchorError::UnknownTimezone`] if the host zone cannot be
    /// read or is unknown to the provider.
    pub fn now_local(&self) -> Result<AnchoredInstant> {
        let zone = self.clock.local_zone()?;
        log::debug!("local zone is {:?}", zone);
        self.now_in(zone)
    }

    /// Re-express `value` in another zone, keeping the absolute instant.
    pub fn shift_zone(
        &self,
        value: &AnchoredInstant,
        zone: impl Into<ZoneRef>,
    ) -> Result<AnchoredInstant> {
        let zone = self.resolve(&zone.into())?;
        Ok(AnchoredInstant::from_utc(value.utc(), zone))
    }
}

/// Interpret a clock reading in `zone` using the fold/gap policy from the
/// module docs.
pub fn localize(naive: &NaiveDateTime, zone: Zone) -> Result<DateTime<Zone>> {
    match zone.from_local_datetime(naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earlier, later) => {
            log::debug!(
                "{} is ambiguous in {}: choosing {} over {}",
                naive,
                zone,
                earlier.offset(),
                later.offset()
            );
            Ok(earlier)
        }
        LocalResult::None => {
            // The offset in force a day earlier is the one before the transition.
            let before = naive
                .checked_sub_signed(TimeDelta::days(1))
                .ok_or_else(|| out_of_range(naive))?;
            let offset = zone.offset_from_utc_datetime(&before).fix();
            let utc = naive
                .checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))
                .ok_or_else(|| out_of_range(naive))?;
            let dt = zone.from_utc_datetime(&utc);
            log::debug!("{} does not exist in {}: rolled forward to {}", naive, zone, dt);
            Ok(dt)
        }
    }
}

pub(crate) fn out_of_range(naive: &NaiveDateTime) -> AnchorError {
    AnchorError::OutOfRange(format!("'{}'", naive))
}

// ── AnchoredInstant ─────────────────────────────────────────────────────────

/// A point in time together with the zone used to present it.
///
/// Equality, ordering and hashing look at the absolute instant only: the
/// same moment seen from two zones compares equal.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredInstant {
    dt: DateTime<Zone>,
}

impl AnchoredInstant {
    /// Anchor with the default engine. See [`AnchorEngine::anchor`].
    pub fn new(instant: Option<Moment>, zone: Option<ZoneRef>) -> Result<Self> {
        AnchorEngine::new().anchor(instant, zone)
    }

    /// Anchor a clock reading (or an aware instant) in `zone`.
    ///
    /// ```
    /// use anchor_engine::AnchoredInstant;
    /// use chrono::NaiveDate;
    ///
    /// let reading = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    /// let v = AnchoredInstant::anchor(reading, "US/Pacific").unwrap();
    /// assert_eq!(v.to_string(), "2015-01-01T00:00:00.000000-08:00[US/Pacific]");
    /// ```
    pub fn anchor(instant: impl Into<Moment>, zone: impl Into<ZoneRef>) -> Result<Self> {
        Self::new(Some(instant.into()), Some(zone.into()))
    }

    /// Anchor an instant that already carries its zone.
    pub fn from_aware(instant: impl Into<Moment>) -> Result<Self> {
        Self::new(Some(instant.into()), None)
    }

    /// The current instant in UTC.
    pub fn now() -> Self {
        AnchorEngine::new().now()
    }

    /// The current instant, presented in `zone`.
    pub fn now_in(zone: impl Into<ZoneRef>) -> Result<Self> {
        AnchorEngine::new().now_in(zone)
    }

    /// The current instant in the operating system's zone.
    pub fn now_local() -> Result<Self> {
        AnchorEngine::new().now_local()
    }

    pub(crate) fn from_utc(utc: DateTime<Utc>, zone: Zone) -> Self {
        Self {
            dt: utc.with_timezone(&zone),
        }
    }

    pub(crate) fn from_zoned(dt: DateTime<Zone>) -> Self {
        Self { dt }
    }

    /// Interpret `naive` in this value's zone.
    pub(crate) fn relocalize(&self, naive: &NaiveDateTime) -> Result<Self> {
        localize(naive, self.zone()).map(Self::from_zoned)
    }

    // ── accessors ──

    pub fn datetime(&self) -> DateTime<Zone> {
        self.dt
    }

    pub fn zone(&self) -> Zone {
        self.dt.timezone()
    }

    pub fn offset(&self) -> ZoneOffset {
        *self.dt.offset()
    }

    pub fn is_dst(&self) -> bool {
        self.dt.offset().is_dst()
    }

    pub fn utc(&self) -> DateTime<Utc> {
        self.dt.with_timezone(&Utc)
    }

    /// The instant with a plain fixed offset, for formatters that do not
    /// know about [`Zone`].
    pub fn fixed(&self) -> DateTime<FixedOffset> {
        self.dt.fixed_offset()
    }

    /// The wall-clock reading in this value's zone.
    pub fn naive_local(&self) -> NaiveDateTime {
        self.dt.naive_local()
    }

    /// The wall-clock reading in UTC.
    pub fn naive_utc(&self) -> NaiveDateTime {
        self.dt.naive_utc()
    }

    /// The local calendar date.
    pub fn date(&self) -> NaiveDate {
        self.dt.date_naive()
    }

    /// The local time of day.
    pub fn time(&self) -> NaiveTime {
        self.dt.time()
    }

    // ── zone re-anchoring ──

    /// Present the same instant in another zone.
    ///
    /// # Errors
    ///
    /// Returns [`AnchorError::UnknownTimezone`] if `zone` cannot be resolved.
    pub fn shift_zone(&self, zone: impl Into<ZoneRef>) -> Result<Self> {
        AnchorEngine::new().shift_zone(self, zone)
    }

    /// Alias for [`AnchoredInstant::shift_zone`].
    pub fn normalize(&self, zone: impl Into<ZoneRef>) -> Result<Self> {
        self.shift_zone(zone)
    }

    // ── epoch ──

    /// Seconds since 1970-01-01T00:00:00Z, with microsecond resolution.
    pub fn epoch(&self) -> f64 {
        let micros = self.epoch_micros();
        let secs = micros.div_euclid(1_000_000);
        let frac = micros.rem_euclid(1_000_000);
        secs as f64 + frac as f64 / 1e6
    }

    /// Whole microseconds since 1970-01-01T00:00:00Z.
    pub fn epoch_micros(&self) -> i64 {
        self.dt.timestamp_micros()
    }

    /// The instant `seconds` after the Unix epoch, anchored in UTC.
    ///
    /// # Errors
    ///
    /// Returns [`AnchorError::InvalidDatetimeInput`] for non-finite or
    /// out-of-range input.
    pub fn from_epoch(seconds: f64) -> Result<Self> {
        if !seconds.is_finite() {
            return Err(AnchorError::InvalidDatetimeInput(format!(
                "epoch seconds must be finite, got {seconds}"
            )));
        }
        let whole = seconds.floor();
        let mut micros = ((seconds - whole) * 1e6).round() as u32;
        let mut secs = whole as i64;
        if micros >= 1_000_000 {
            secs += 1;
            micros -= 1_000_000;
        }
        // `as` saturates, so anything beyond chrono's range fails below.
        Self::from_epoch_parts(secs, micros, seconds)
    }

    /// The instant `micros` microseconds after the Unix epoch, anchored in UTC.
    pub fn from_epoch_micros(micros: i64) -> Result<Self> {
        DateTime::from_timestamp_micros(micros)
            .map(|utc| Self::from_utc(utc, Zone::UTC))
            .ok_or_else(|| {
                AnchorError::InvalidDatetimeInput(format!(
                    "epoch microseconds out of range: {micros}"
                ))
            })
    }

    fn from_epoch_parts(secs: i64, micros: u32, original: f64) -> Result<Self> {
        DateTime::from_timestamp(secs, micros * 1_000)
            .map(|utc| Self::from_utc(utc, Zone::UTC))
            .ok_or_else(|| {
                AnchorError::InvalidDatetimeInput(format!("epoch seconds out of range: {original}"))
            })
    }

    // ── fixed-duration arithmetic ──

    /// Add an absolute duration. The zone is kept.
    pub fn checked_add(&self, delta: TimeDelta) -> Result<Self> {
        self.dt
            .checked_add_signed(delta)
            .map(Self::from_zoned)
            .ok_or_else(|| AnchorError::OutOfRange(format!("{} + {}", self, delta)))
    }

    /// Subtract an absolute duration. The zone is kept.
    pub fn checked_sub(&self, delta: TimeDelta) -> Result<Self> {
        self.dt
            .checked_sub_signed(delta)
            .map(Self::from_zoned)
            .ok_or_else(|| AnchorError::OutOfRange(format!("{} - {}", self, delta)))
    }

    /// The absolute duration from `earlier` to `self`.
    pub fn since(&self, earlier: &AnchoredInstant) -> TimeDelta {
        self.dt.signed_duration_since(earlier.dt)
    }

    // ── field replacement ──

    /// Override individual wall-clock fields and re-anchor in the same zone.
    ///
    /// # Errors
    ///
    /// Returns [`AnchorError::InvalidDatetimeInput`] if the resulting fields do
    /// not form a valid date and time (for example February 30th).
    pub fn replace(&self, fields: Fields) -> Result<Self> {
        let local = self.naive_local();
        let year = fields.year.unwrap_or(local.year());
        let month = fields.month.unwrap_or(local.month());
        let day = fields.day.unwrap_or(local.day());
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            AnchorError::InvalidDatetimeInput(format!(
                "no such date: {year:04}-{month:02}-{day:02}"
            ))
        })?;

        let hour = fields.hour.unwrap_or(local.hour());
        let minute = fields.minute.unwrap_or(local.minute());
        let second = fields.second.unwrap_or(local.second());
        let nano = match fields.microsecond {
            Some(micro) if micro < 1_000_000 => micro * 1_000,
            Some(micro) => {
                return Err(AnchorError::InvalidDatetimeInput(format!(
                    "microsecond out of range: {micro}"
                )))
            }
            None => local.nanosecond(),
        };
        let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nano).ok_or_else(|| {
            AnchorError::InvalidDatetimeInput(format!(
                "no such time: {hour:02}:{minute:02}:{second:02}"
            ))
        })?;

        self.relocalize(&date.and_time(time))
    }
}

impl PartialEq for AnchoredInstant {
    fn eq(&self, other: &Self) -> bool {
        self.dt == other.dt
    }
}

impl Eq for AnchoredInstant {}

impl PartialOrd for AnchoredInstant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AnchoredInstant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dt.cmp(&other.dt)
    }
}

impl Hash for AnchoredInstant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.dt.timestamp(), self.dt.timestamp_subsec_nanos()).hash(state);
    }
}

impl Sub for AnchoredInstant {
    type Output = TimeDelta;

    fn sub(self, rhs: Self) -> TimeDelta {
        self.since(&rhs)
    }
}

impl Sub for &AnchoredInstant {
    type Output = TimeDelta;

    fn sub(self, rhs: Self) -> TimeDelta {
        self.since(rhs)
    }
}

impl From<DateTime<Zone>> for AnchoredInstant {
    fn from(dt: DateTime<Zone>) -> Self {
        Self { dt }
    }
}

impl fmt::Display for AnchoredInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]",
            self.dt.to_rfc3339_opts(SecondsFormat::Micros, false),
            self.zone()
        )
    }
}

/// Wall-clock fields to override with [`AnchoredInstant::replace`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fields {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
    pub microsecond: Option<u32>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn day(mut self, day: u32) -> Self {
        self.day = Some(day);
        self
    }

    pub fn hour(mut self, hour: u32) -> Self {
        self.hour = Some(hour);
        self
    }

    pub fn minute(mut self, minute: u32) -> Self {
        self.minute = Some(minute);
        self
    }

    pub fn second(mut self, second: u32) -> Self {
        self.second = Some(second);
        self
    }

    pub fn microsecond(mut self, microsecond: u32) -> Self {
        self.microsecond = Some(microsecond);
        self
    }
}
