//! Candidate instants and the naive/aware classifier.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::zone::Zone;

/// A candidate instant handed to the anchor engine.
///
/// A naive moment is a bare clock reading. An aware moment already carries
/// its zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    Naive(NaiveDateTime),
    Aware(DateTime<Zone>),
}

impl Moment {
    pub fn is_naive(&self) -> bool {
        matches!(self, Moment::Naive(_))
    }

    /// The clock reading, in the moment's own zone when it has one.
    pub fn naive_local(&self) -> NaiveDateTime {
        match self {
            Moment::Naive(naive) => *naive,
            Moment::Aware(dt) => dt.naive_local(),
        }
    }
}

/// Returns `true` if `candidate` carries no zone information. An absent
/// candidate counts as naive.
pub fn is_naive(candidate: Option<&Moment>) -> bool {
    candidate.is_none_or(Moment::is_naive)
}

impl From<NaiveDateTime> for Moment {
    fn from(naive: NaiveDateTime) -> Self {
        Moment::Naive(naive)
    }
}

impl From<DateTime<Zone>> for Moment {
    fn from(dt: DateTime<Zone>) -> Self {
        Moment::Aware(dt)
    }
}

impl From<DateTime<Utc>> for Moment {
    fn from(dt: DateTime<Utc>) -> Self {
        Moment::Aware(dt.with_timezone(&Zone::UTC))
    }
}

impl From<DateTime<FixedOffset>> for Moment {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        let zone = Zone::Fixed(*dt.offset());
        Moment::Aware(dt.with_timezone(&zone))
    }
}

impl From<DateTime<Tz>> for Moment {
    fn from(dt: DateTime<Tz>) -> Self {
        let zone = Zone::Named(dt.timezone());
        Moment::Aware(dt.with_timezone(&zone))
    }
}
