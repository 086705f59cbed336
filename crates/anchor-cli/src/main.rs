use std::io::Write;
use std::process::ExitCode;

use anchor_engine::{
    AnchorEngine, AnchoredInstant, FixedClock, Frequency, RecurrenceSpec, ShiftSpec, Tzdb,
    WeekdayRule, ZoneRef,
};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc, Weekday};
use clap::{Parser, Subcommand};

mod logger;

type Engine = AnchorEngine<Tzdb, FixedClock>;

#[derive(Parser)]
#[command(name = "anchor", version, about = "Timezone-anchored datetime arithmetic")]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current instant
    Now {
        /// Zone to present the instant in
        #[arg(long)]
        tz: Option<String>,
        /// Present the instant in the system's zone
        #[arg(long, conflicts_with = "tz")]
        local: bool,
    },
    /// Shift a datetime, e.g. `next_friday` or `last_month`
    Shift {
        datetime: String,
        verb: String,
        #[arg(long, default_value_t = 1)]
        count: u32,
        /// Zone for datetimes without an offset
        #[arg(long)]
        tz: Option<String>,
    },
    /// Truncate a datetime to second, minute, hour, day, month or year
    Truncate {
        datetime: String,
        level: String,
        #[arg(long)]
        tz: Option<String>,
    },
    /// Present a datetime in another zone
    Convert {
        datetime: String,
        zone: String,
        #[arg(long)]
        tz: Option<String>,
    },
    /// Print seconds since the Unix epoch
    Epoch {
        datetime: String,
        #[arg(long)]
        tz: Option<String>,
    },
    /// Anchor epoch seconds in UTC (or in --tz)
    FromEpoch {
        #[arg(allow_hyphen_values = true)]
        seconds: f64,
        #[arg(long)]
        tz: Option<String>,
    },
    /// Print the duration between two datetimes
    Between {
        start: String,
        end: String,
        #[arg(long)]
        tz: Option<String>,
    },
    /// Print a recurring sequence
    Stops {
        /// yearly, monthly, weekly, daily, hourly, minutely or secondly
        #[arg(long)]
        freq: String,
        #[arg(long, default_value_t = 1)]
        interval: u16,
        #[arg(long)]
        count: Option<u32>,
        /// First wall-clock reading (no offset)
        #[arg(long)]
        start: Option<String>,
        /// Last wall-clock reading, inclusive (no offset)
        #[arg(long)]
        until: Option<String>,
        #[arg(long, default_value = "UTC")]
        tz: String,
        #[arg(long, value_delimiter = ',')]
        by_month: Vec<u8>,
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        by_month_day: Vec<i8>,
        /// Weekdays such as `mon`, `2tue` or `-1fri`
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        by_weekday: Vec<String>,
        /// Maximum number of elements to print
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            for cause in err.chain() {
                if let Some(io) = cause.downcast_ref::<std::io::Error>() {
                    if io.kind() == std::io::ErrorKind::BrokenPipe {
                        return ExitCode::SUCCESS;
                    }
                }
            }
            let _ = writeln!(std::io::stderr(), "Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    if logger::Logger::init().is_ok() {
        log::set_max_level(logger::level_for(cli.verbose));
    }

    let now = read_env_anchor_now()?.unwrap_or_else(Utc::now);
    let engine = AnchorEngine::with_parts(Tzdb, FixedClock(now));

    let output = match cli.command {
        Commands::Now { tz, local } => {
            let value = match tz {
                Some(tz) => engine.now_in(tz)?,
                None if local => engine.now_local()?,
                None => engine.now(),
            };
            serde_json::to_value(value.summary())?
        }
        Commands::Shift {
            datetime,
            verb,
            count,
            tz,
        } => {
            let value = anchor_arg(&engine, &datetime, tz.as_deref())?;
            let spec: ShiftSpec = verb.parse()?;
            let shifted = value
                .apply(&spec.times(count))
                .with_context(|| format!("failed to shift {value} by {verb}"))?;
            serde_json::to_value(shifted.summary())?
        }
        Commands::Truncate {
            datetime,
            level,
            tz,
        } => {
            let value = anchor_arg(&engine, &datetime, tz.as_deref())?;
            serde_json::to_value(value.truncate_to(&level)?.summary())?
        }
        Commands::Convert { datetime, zone, tz } => {
            let value = anchor_arg(&engine, &datetime, tz.as_deref())?;
            serde_json::to_value(engine.shift_zone(&value, zone)?.summary())?
        }
        Commands::Epoch { datetime, tz } => {
            let value = anchor_arg(&engine, &datetime, tz.as_deref())?;
            serde_json::json!({
                "epoch": value.epoch(),
                "epoch_micros": value.epoch_micros(),
            })
        }
        Commands::FromEpoch { seconds, tz } => {
            let mut value = AnchoredInstant::from_epoch(seconds)?;
            if let Some(tz) = tz {
                value = engine.shift_zone(&value, tz)?;
            }
            serde_json::to_value(value.summary())?
        }
        Commands::Between { start, end, tz } => {
            let start = anchor_arg(&engine, &start, tz.as_deref())?;
            let end = anchor_arg(&engine, &end, tz.as_deref())?;
            serde_json::to_value(end.duration_since(&start))?
        }
        Commands::Stops {
            freq,
            interval,
            count,
            start,
            until,
            tz,
            by_month,
            by_month_day,
            by_weekday,
            limit,
        } => {
            let mut spec = RecurrenceSpec::new(freq.parse::<Frequency>()?)
                .interval(interval)
                .zone(tz)
                .by_month(by_month)
                .by_month_day(by_month_day)
                .by_weekday(
                    by_weekday
                        .iter()
                        .map(|s| parse_weekday_rule(s))
                        .collect::<Result<Vec<_>>>()?,
                );
            if let Some(count) = count {
                spec = spec.count(count);
            }
            if let Some(start) = start {
                spec = spec.start(parse_wall_clock(&start)?);
            }
            if let Some(until) = until {
                spec = spec.until(parse_wall_clock(&until)?);
            }
            let stops = engine.stops(&spec)?;
            let summaries = stops
                .iter()
                .take(limit)
                .map(|v| v.map(|v| v.summary()))
                .collect::<anchor_engine::Result<Vec<_>>>()?;
            serde_json::to_value(summaries)?
        }
    };

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &output)?;
    writeln!(stdout)?;
    Ok(())
}

/// `ANCHOR_NOW` pins the current instant, for reproducible output.
fn read_env_anchor_now() -> Result<Option<DateTime<Utc>>> {
    let Some(val) = std::env::var_os("ANCHOR_NOW") else {
        return Ok(None);
    };
    let Some(val) = val.to_str() else {
        anyhow::bail!("`ANCHOR_NOW` environment variable is not valid UTF-8: {val:?}")
    };
    let now = DateTime::parse_from_rfc3339(val)
        .context("`ANCHOR_NOW` environment variable is not a valid RFC 3339 timestamp")?
        .with_timezone(&Utc);
    log::trace!("setting current time to `{now}` from `ANCHOR_NOW`");
    Ok(Some(now))
}

fn anchor_arg(engine: &Engine, arg: &str, tz: Option<&str>) -> Result<AnchoredInstant> {
    let (reading, offset) = parse_datetime(arg)?;
    engine
        .anchor_parsed(reading, offset, tz.map(ZoneRef::from))
        .with_context(|| format!("failed to anchor '{arg}'"))
}

/// RFC 3339 carries an offset. ISO 8601 without one is a bare wall-clock reading.
fn parse_datetime(s: &str) -> Result<(NaiveDateTime, Option<FixedOffset>)> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok((dt.naive_local(), Some(*dt.offset())));
    }
    parse_wall_clock(s).map(|naive| (naive, None))
}

fn parse_wall_clock(s: &str) -> Result<NaiveDateTime> {
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
        .with_context(|| format!("'{s}' is not an RFC 3339 or ISO 8601 datetime"))
}

fn parse_weekday_rule(s: &str) -> Result<WeekdayRule> {
    let split = s
        .find(|c: char| c.is_ascii_alphabetic())
        .with_context(|| format!("'{s}' has no weekday"))?;
    let (nth, day) = s.split_at(split);
    let day: Weekday = day
        .parse()
        .map_err(|_| anyhow::anyhow!("'{day}' is not a weekday"))?;
    if nth.is_empty() {
        return Ok(WeekdayRule::Every(day));
    }
    let n: i16 = nth
        .trim_start_matches('+')
        .parse()
        .with_context(|| format!("'{nth}' is not a weekday position"))?;
    Ok(WeekdayRule::Nth(n, day))
}
