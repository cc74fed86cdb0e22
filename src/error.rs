/// Error type returned when building loggers or reading configuration.
///
/// Every variant is a startup failure: callers are expected to stop
/// rather than fall back to a default.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid log level {0:?}, must be one of trace, debug, info, warn, error")]
    InvalidLevel(String),

    #[error("unknown logger kind {0:?}, must be one of console, formatted, cloud")]
    UnknownKind(String),

    #[error("invalid inspect depth {0:?}, must be a non-negative integer or \"none\"")]
    InvalidDepth(String),

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("reporting logger requires an error reporter")]
    MissingReporter,

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

/// Error type returned by [`LogSink`](crate::sink::LogSink) writes.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("sink buffer is full, line dropped")]
    Full,

    #[error("sink is closed")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
