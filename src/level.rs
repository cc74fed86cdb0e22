use crate::error::ConfigError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

/// Call level, totally ordered `Trace < Debug < Info < Warn < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub const ALL: [Level; 5] = [Level::Trace, Level::Debug, Level::Info, Level::Warn, Level::Error];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    /// Normalized severity tag. `Trace` has no severity of its own and
    /// reports as `DEBUG`.
    pub fn severity(self) -> Severity {
        match self {
            Level::Trace | Level::Debug => Severity::Debug,
            Level::Info => Severity::Info,
            Level::Warn => Severity::Warning,
            Level::Error => Severity::Error,
        }
    }

    fn from_u8(raw: u8) -> Level {
        Level::ALL.get(usize::from(raw)).copied().unwrap_or(Level::Error)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ConfigError::InvalidLevel(s.to_string()))
    }
}

/// Severity tag written into records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Severity of a request record: `INFO` below 500, `ERROR` otherwise.
    pub fn for_status(status: u16) -> Severity {
        if status < 500 {
            Severity::Info
        } else {
            Severity::Error
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

/// Shared minimum-level cell.
///
/// Loggers read their cell on every call, so [`MinLevel::set`] takes
/// effect immediately for every logger holding a clone of it.
#[derive(Clone)]
pub struct MinLevel(Arc<AtomicU8>);

impl MinLevel {
    /// A private cell, independent of the process-wide one.
    pub fn new(level: Level) -> Self {
        MinLevel(Arc::new(AtomicU8::new(level as u8)))
    }

    /// The process-wide cell, initialized to `info`.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<MinLevel> = OnceLock::new();
        GLOBAL.get_or_init(|| MinLevel::new(Level::Info)).clone()
    }

    pub fn get(&self) -> Level {
        Level::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, level: Level) {
        self.0.store(level as u8, Ordering::Relaxed);
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.get()
    }
}

impl fmt::Debug for MinLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MinLevel").field(&self.get()).finish()
    }
}

/// Current process-wide minimum level.
pub fn min_level() -> Level {
    MinLevel::global().get()
}

/// Change the process-wide minimum level at runtime.
pub fn set_min_level(level: Level) {
    MinLevel::global().set(level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert_eq!("debug".parse::<Level>().unwrap(), Level::Debug);
        assert_eq!(" WARN ".parse::<Level>().unwrap(), Level::Warn);
    }

    #[test]
    fn rejects_unknown_level() {
        let err = "verbose".parse::<Level>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLevel(ref s) if s == "verbose"));
    }

    #[test]
    fn levels_are_ordered() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn severity_mapping() {
        assert_eq!(Level::Trace.severity(), Severity::Debug);
        assert_eq!(Level::Warn.severity(), Severity::Warning);
        assert_eq!(Severity::for_status(499), Severity::Info);
        assert_eq!(Severity::for_status(500), Severity::Error);
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"WARNING\"");
    }

    #[test]
    fn private_cell_changes_take_effect() {
        let cell = MinLevel::new(Level::Info);
        let shared = cell.clone();
        assert!(!shared.enabled(Level::Debug));
        cell.set(Level::Debug);
        assert!(shared.enabled(Level::Debug));
    }
}
