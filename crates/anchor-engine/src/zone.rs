//! Zone handles and the zone resolver.
//!
//! A [`Zone`] is either a named IANA zone, whose offset and DST rules come
//! from `chrono-tz`, or a fixed UTC offset. `Zone` implements
//! [`chrono::TimeZone`], so every anchored instant is stored as a
//! `DateTime<Zone>` and never loses its zone.
//!
//! [`ZoneRef`] is what callers hand in: a name, an offset, or an already
//! resolved zone. [`ZoneRef::resolve_with`] is the only place where zone
//! strings are interpreted.

use std::fmt;

use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone,
    Utc,
};
use chrono_tz::{OffsetComponents, Tz, TzOffset};

use crate::error::AnchorError;
use crate::temporal::format_offset_seconds;

// ── Zone ────────────────────────────────────────────────────────────────────

/// A canonical zone handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// A named IANA zone, subject to DST rules.
    Named(Tz),
    /// A fixed UTC offset.
    Fixed(FixedOffset),
}

impl Zone {
    pub const UTC: Zone = Zone::Named(Tz::UTC);

    /// The IANA name for named zones, or the `±HH:MM` offset for fixed ones.
    pub fn name(&self) -> String {
        match self {
            Zone::Named(tz) => tz.name().to_string(),
            Zone::Fixed(offset) => format_offset_seconds(offset.local_minus_utc()),
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Zone::Fixed(_))
    }

    /// The UTC offset and DST status in force at `instant`.
    pub fn offset_at(&self, instant: &DateTime<Utc>) -> ZoneOffset {
        self.offset_from_utc_datetime(&instant.naive_utc())
    }

    fn wrap_tz(&self, offset: &TzOffset) -> ZoneOffset {
        ZoneOffset {
            zone: *self,
            fixed: offset.fix(),
            dst: offset.dst_offset() != TimeDelta::zero(),
        }
    }

    fn wrap_fixed(&self, offset: FixedOffset) -> ZoneOffset {
        ZoneOffset {
            zone: *self,
            fixed: offset,
            dst: false,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Named(tz) => f.write_str(tz.name()),
            Zone::Fixed(offset) => f.write_str(&format_offset_seconds(offset.local_minus_utc())),
        }
    }
}

impl From<Tz> for Zone {
    fn from(tz: Tz) -> Self {
        Zone::Named(tz)
    }
}

impl From<FixedOffset> for Zone {
    fn from(offset: FixedOffset) -> Self {
        Zone::Fixed(offset)
    }
}

/// The offset of a [`Zone`] at one particular instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneOffset {
    zone: Zone,
    fixed: FixedOffset,
    dst: bool,
}

impl ZoneOffset {
    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.fixed
    }

    /// Seconds east of UTC.
    pub fn local_minus_utc(&self) -> i32 {
        self.fixed.local_minus_utc()
    }

    /// Whether daylight saving time is in effect. Always `false` for fixed zones.
    pub fn is_dst(&self) -> bool {
        self.dst
    }
}

impl Offset for ZoneOffset {
    fn fix(&self) -> FixedOffset {
        self.fixed
    }
}

impl fmt::Display for ZoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fixed)
    }
}

impl TimeZone for Zone {
    type Offset = ZoneOffset;

    fn from_offset(offset: &ZoneOffset) -> Self {
        offset.zone
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<ZoneOffset> {
        match self {
            Zone::Named(tz) => tz.offset_from_local_date(local).map(|o| self.wrap_tz(&o)),
            Zone::Fixed(offset) => LocalResult::Single(self.wrap_fixed(*offset)),
        }
    }

    fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<ZoneOffset> {
        match self {
            Zone::Named(tz) => tz
                .offset_from_local_datetime(local)
                .map(|o| self.wrap_tz(&o)),
            Zone::Fixed(offset) => LocalResult::Single(self.wrap_fixed(*offset)),
        }
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> ZoneOffset {
        match self {
            Zone::Named(tz) => self.wrap_tz(&tz.offset_from_utc_date(utc)),
            Zone::Fixed(offset) => self.wrap_fixed(*offset),
        }
    }

    fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> ZoneOffset {
        match self {
            Zone::Named(tz) => self.wrap_tz(&tz.offset_from_utc_datetime(utc)),
            Zone::Fixed(offset) => self.wrap_fixed(*offset),
        }
    }
}

// ── Provider ────────────────────────────────────────────────────────────────

/// A source of timezone rules, looked up by name.
///
/// Providers are read-only once built and may be shared freely.
pub trait ZoneProvider {
    fn lookup(&self, name: &str) -> Option<Zone>;
}

impl<P: ZoneProvider + ?Sized> ZoneProvider for &P {
    fn lookup(&self, name: &str) -> Option<Zone> {
        (**self).lookup(name)
    }
}

/// The IANA database compiled into `chrono-tz`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tzdb;

impl ZoneProvider for Tzdb {
    fn lookup(&self, name: &str) -> Option<Zone> {
        name.parse::<Tz>().ok().map(Zone::Named)
    }
}

// ── ZoneRef ─────────────────────────────────────────────────────────────────

/// A reference to a zone, as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneRef {
    /// An IANA name (`"US/Eastern"`) or an offset string (`"-05:00"`).
    Name(String),
    /// A fixed offset.
    Offset(FixedOffset),
    /// A zone that has already been resolved.
    Resolved(Zone),
}

impl ZoneRef {
    /// Resolve against the compiled IANA database.
    pub fn resolve(&self) -> Result<Zone, AnchorError> {
        self.resolve_with(&Tzdb)
    }

    /// Resolve against `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`AnchorError::UnknownTimezone`] if the name is neither a valid
    /// offset string nor known to the provider.
    pub fn resolve_with<P>(&self, provider: &P) -> Result<Zone, AnchorError>
    where
        P: ZoneProvider + ?Sized,
    {
        match self {
            ZoneRef::Resolved(zone) => Ok(*zone),
            ZoneRef::Offset(offset) => Ok(Zone::Fixed(*offset)),
            ZoneRef::Name(name) => resolve_name(name, provider),
        }
    }
}

impl From<&str> for ZoneRef {
    fn from(name: &str) -> Self {
        ZoneRef::Name(name.to_string())
    }
}

impl From<String> for ZoneRef {
    fn from(name: String) -> Self {
        ZoneRef::Name(name)
    }
}

impl From<&String> for ZoneRef {
    fn from(name: &String) -> Self {
        ZoneRef::Name(name.clone())
    }
}

impl From<FixedOffset> for ZoneRef {
    fn from(offset: FixedOffset) -> Self {
        ZoneRef::Offset(offset)
    }
}

impl From<Zone> for ZoneRef {
    fn from(zone: Zone) -> Self {
        ZoneRef::Resolved(zone)
    }
}

impl From<Tz> for ZoneRef {
    fn from(tz: Tz) -> Self {
        ZoneRef::Resolved(Zone::Named(tz))
    }
}

fn resolve_name<P: ZoneProvider + ?Sized>(name: &str, provider: &P) -> Result<Zone, AnchorError> {
    let trimmed = name.trim();
    if trimmed == "Z" || trimmed == "z" {
        return Ok(Zone::UTC);
    }
    if is_possible_offset(trimmed) {
        return parse_offset(trimmed)
            .map(Zone::Fixed)
            .ok_or_else(|| AnchorError::UnknownTimezone(format!("'{}'", name)));
    }
    provider
        .lookup(trimmed)
        .ok_or_else(|| AnchorError::UnknownTimezone(format!("'{}'", name)))
}

fn is_possible_offset(s: &str) -> bool {
    matches!(s.as_bytes().first(), Some(b'+' | b'-'))
        && s[1..].chars().all(|ch| matches!(ch, '0'..='9' | ':'))
}

/// Parse `±HH`, `±HHMM`, `±HH:MM`, `±HHMMSS` or `±HH:MM:SS`.
pub fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1i32, &s[1..]),
        b'-' => (-1i32, &s[1..]),
        _ => return None,
    };
    if !rest.is_ascii() {
        return None;
    }

    let groups: Vec<&str> = if rest.contains(':') {
        rest.split(':').collect()
    } else {
        (0..rest.len())
            .step_by(2)
            .map(|i| &rest[i..(i + 2).min(rest.len())])
            .collect()
    };
    if groups.is_empty() || groups.len() > 3 {
        return None;
    }

    let mut parts = [0i32; 3];
    for (slot, group) in parts.iter_mut().zip(&groups) {
        if group.len() != 2 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = group.parse().ok()?;
    }
    let [hours, minutes, seconds] = parts;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60 + seconds))
}
