use crate::dump::DEFAULT_DEPTH;
use crate::env::{Environment, LOG_DEPTH_ENV, LOG_FORMAT_ENV, LOG_LEVEL_ENV};
use crate::error::ConfigError;
use crate::level::{Level, MinLevel};
use crate::logger::{Logger, LoggerKind};

/// Startup logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub min_level: Level,
    pub kind: LoggerKind,
    pub depth: Option<usize>,
}

impl LogConfig {
    /// Defaults for the given environment: `info`, depth 3, formatted lines
    /// on a terminal and cloud records elsewhere.
    pub fn for_environment(environment: Environment) -> Self {
        let kind = match environment {
            Environment::Interactive => LoggerKind::Formatted,
            Environment::Cloud => LoggerKind::Cloud,
        };
        Self {
            min_level: Level::Info,
            kind,
            depth: Some(DEFAULT_DEPTH),
        }
    }

    /// Read `LOG_LEVEL`, `LOG_FORMAT` and `LOG_DEPTH` from the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(Environment::detect(), |key| std::env::var(key).ok())
    }

    /// Same as [`LogConfig::from_env`] with an arbitrary key lookup.
    ///
    /// Unset or blank variables keep their defaults; invalid values are
    /// errors.
    pub fn from_lookup<F>(environment: Environment, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::for_environment(environment);
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(level) = get(LOG_LEVEL_ENV) {
            config.min_level = level.parse()?;
        }
        if let Some(kind) = get(LOG_FORMAT_ENV) {
            config.kind = match kind.parse()? {
                // needs a caller-supplied reporter
                LoggerKind::Reporting => return Err(ConfigError::UnknownKind(kind)),
                other => other,
            };
        }
        if let Some(depth) = get(LOG_DEPTH_ENV) {
            config.depth = parse_depth(&depth)?;
        }
        Ok(config)
    }

    /// Logger of the configured kind and depth writing to stdout, gated by
    /// the process-wide level. Applying `min_level` is left to the caller.
    pub fn logger(&self) -> Result<Logger, ConfigError> {
        Logger::builder(self.kind)
            .min_level(MinLevel::global())
            .depth(self.depth)
            .build()
    }
}

fn parse_depth(raw: &str) -> Result<Option<usize>, ConfigError> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidDepth(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_follow_environment() {
        let cloud = LogConfig::from_lookup(Environment::Cloud, lookup(&[])).unwrap();
        assert_eq!(cloud.kind, LoggerKind::Cloud);
        assert_eq!(cloud.min_level, Level::Info);
        assert_eq!(cloud.depth, Some(3));

        let tty = LogConfig::from_lookup(Environment::Interactive, lookup(&[])).unwrap();
        assert_eq!(tty.kind, LoggerKind::Formatted);
    }

    #[test]
    fn reads_all_variables() {
        let config = LogConfig::from_lookup(
            Environment::Cloud,
            lookup(&[("LOG_LEVEL", "DEBUG"), ("LOG_FORMAT", "console"), ("LOG_DEPTH", "none")]),
        )
        .unwrap();
        assert_eq!(
            config,
            LogConfig {
                min_level: Level::Debug,
                kind: LoggerKind::Console,
                depth: None,
            }
        );
    }

    #[test]
    fn invalid_level_fails_fast() {
        let err = LogConfig::from_lookup(Environment::Cloud, lookup(&[("LOG_LEVEL", "verbose")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLevel(ref l) if l == "verbose"));
    }

    #[test]
    fn invalid_depth_and_kind() {
        assert!(matches!(
            LogConfig::from_lookup(Environment::Cloud, lookup(&[("LOG_DEPTH", "-1")])),
            Err(ConfigError::InvalidDepth(_))
        ));
        assert!(matches!(
            LogConfig::from_lookup(Environment::Cloud, lookup(&[("LOG_FORMAT", "reporting")])),
            Err(ConfigError::UnknownKind(_))
        ));
    }

    #[test]
    fn builds_the_configured_logger() {
        let config = LogConfig::from_lookup(
            Environment::Interactive,
            lookup(&[("LOG_FORMAT", "cloud"), ("LOG_DEPTH", "1")]),
        )
        .unwrap();
        let logger = config.logger().unwrap();
        assert_eq!(logger.kind(), LoggerKind::Cloud);
        assert_eq!(logger.depth(), Some(1));
    }

    #[test]
    fn blank_values_keep_defaults() {
        let config = LogConfig::from_lookup(Environment::Cloud, lookup(&[("LOG_LEVEL", " ")])).unwrap();
        assert_eq!(config.min_level, Level::Info);
    }
}
