// Variables read by `LogConfig::from_env`. Loggers never read the
// environment themselves.

/// Minimum level: `trace`, `debug`, `info`, `warn` or `error`.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Logger variant: `console`, `formatted` or `cloud`.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Inspection depth: a non-negative integer, or `none` for unbounded.
pub const LOG_DEPTH_ENV: &str = "LOG_DEPTH";

/// Where the process is running, as far as logging cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// stdout is a terminal.
    Interactive,
    /// stdout is captured by a log collector.
    Cloud,
}

impl Environment {
    pub fn detect() -> Environment {
        use std::io::IsTerminal;
        if std::io::stdout().is_terminal() {
            Environment::Interactive
        } else {
            Environment::Cloud
        }
    }
}
