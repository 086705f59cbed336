// A minimal stderr logger for the `log` facade. Filtering is left to
// `log::set_max_level`, which `main` sets from the `-v` flag.

use std::path::Path;
use std::sync::LazyLock;

use chrono::{SecondsFormat, Utc};
use log::Log;

#[derive(Debug)]
pub struct Logger;

impl Logger {
    /// Install the logger globally. Fails if another logger is already set.
    pub fn init() -> Result<(), log::SetLoggerError> {
        static LOGGER: Logger = Logger;
        log::set_logger(&LOGGER)
    }
}

impl Log for Logger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        match (record.file(), record.line()) {
            (Some(file), Some(line)) => {
                eprintln!(
                    "{}|{}|{}:{}: {}",
                    now,
                    record.level(),
                    relative(file),
                    line,
                    record.args()
                );
            }
            _ => {
                eprintln!("{}|{}|{}: {}", now, record.level(), record.target(), record.args());
            }
        }
    }

    fn flush(&self) {}
}

/// Map `-v` occurrences to a level: warn, then debug, then trace.
pub fn level_for(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn relative(path: &str) -> &str {
    static CWD: LazyLock<Option<std::path::PathBuf>> =
        LazyLock::new(|| std::env::current_dir().ok());
    let Some(cwd) = CWD.as_deref() else { return path };
    Path::new(path)
        .strip_prefix(cwd)
        .ok()
        .and_then(Path::to_str)
        .unwrap_or(path)
}
