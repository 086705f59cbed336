//! # anchor-engine
//!
//! Timezone-anchored instants with DST-safe calendar arithmetic.
//!
//! An [`AnchoredInstant`] is a point in time together with the zone used to
//! present it. Every value is built by the [`AnchorEngine`], which decides
//! how a candidate instant and a zone reference combine, and every
//! operation (shift, truncate, re-anchor, field replace) produces a new
//! value through the same rules.
//!
//! ## Modules
//!
//! - [`moment`]: Candidate instants and the naive/aware classifier
//! - [`zone`]: Zone handles, fixed offsets and the zone resolver
//! - [`anchor`]: The anchored instant, the anchor engine and the fold/gap policy
//! - [`shift`]: Directional shifts by calendar unit or named weekday
//! - [`truncate`]: Truncation and day/week boundaries
//! - [`recurrence`]: Recurring sequences ("stops") built on `rrule`
//! - [`temporal`]: Serializable summaries, durations and week-start configuration
//! - [`error`]: Error types
//!
//! ## Example
//!
//! ```
//! use anchor_engine::{AnchoredInstant, Granularity, ShiftUnit};
//! use chrono::{NaiveDate, Weekday};
//!
//! let reading = NaiveDate::from_ymd_opt(2013, 1, 3)
//!     .unwrap()
//!     .and_hms_micro_opt(4, 31, 14, 148540)
//!     .unwrap();
//! let v = AnchoredInstant::anchor(reading, "UTC").unwrap();
//!
//! let friday = v.next(ShiftUnit::Weekday(Weekday::Fri)).unwrap();
//! assert_eq!(friday.to_string(), "2013-01-04T04:31:14.148540+00:00[UTC]");
//!
//! let hour = v.truncate(Granularity::Hour).unwrap();
//! assert_eq!(hour.to_string(), "2013-01-03T04:00:00.000000+00:00[UTC]");
//!
//! let eastern = v.shift_zone("US/Eastern").unwrap();
//! assert_eq!(eastern, v);
//! assert_eq!(eastern.to_string(), "2013-01-02T23:31:14.148540-05:00[US/Eastern]");
//! ```

pub mod anchor;
pub mod error;
pub mod moment;
pub mod recurrence;
pub mod shift;
pub mod temporal;
pub mod truncate;
pub mod zone;

pub use anchor::{localize, AnchorEngine, AnchoredInstant, Clock, Fields, FixedClock, SystemClock};
pub use error::{AnchorError, Result};
pub use moment::{is_naive, Moment};
pub use recurrence::{stops, Frequency, RecurrenceSpec, Stops, StopsIter, WeekdayRule};
pub use shift::{Direction, ShiftSpec, ShiftUnit};
pub use temporal::{DurationInfo, InstantSummary, WeekStartDay};
pub use truncate::Granularity;
pub use zone::{parse_offset, Tzdb, Zone, ZoneOffset, ZoneProvider, ZoneRef};
