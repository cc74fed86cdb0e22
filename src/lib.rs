//! Structured logging facade.
//!
//! Logging calls take an argument list ([`args!`]) that may mix strings,
//! printf-style templates, numbers, errors, objects and arrays. The list
//! is interpolated, split into message text and structured fields, and
//! rendered by one of the [`LoggerKind`] variants into a sink.
//!
//! ```
//! use cloudlog::{args, Level, Logger, LoggerKind, MemorySink, MinLevel};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! let logger = Logger::builder(LoggerKind::Cloud)
//!     .sink(sink.clone())
//!     .min_level(MinLevel::new(Level::Info))
//!     .build()
//!     .unwrap();
//!
//! logger.info(args!["%s -> %d", "foo", 1000]);
//! assert_eq!(sink.records()[0]["message"], "foo -> 1000");
//! ```

#[macro_use]
mod macros;

pub mod async_sink;
pub mod config;
pub mod dump;
pub mod env;
pub mod error;
pub mod init;
pub mod layer;
pub mod level;
mod line_format;
pub mod logger;
pub mod matcher;
pub mod middleware;
pub mod noop_sink;
pub mod printf;
pub mod reconcile;
pub mod record;
pub mod redact;
pub mod reporting;
pub mod request;
pub mod sink;
pub mod trace;
pub mod value;

#[cfg(feature = "middleware")]
pub mod service;

pub use async_sink::AsyncStdoutSink;
pub use config::LogConfig;
pub use dump::dump;
pub use env::Environment;
pub use error::{ConfigError, SinkError};
pub use init::BridgeConfig;
pub use layer::FacadeLayer;
pub use level::{Level, MinLevel, Severity};
pub use line_format::{Clock, Palette};
pub use logger::{Logger, LoggerBuilder, LoggerKind};
pub use matcher::Matcher;
pub use middleware::{
    AuthUser, MiddlewareConfig, PendingRequest, RecordParams, RequestBody, RequestInfo, RequestLogger,
    ResponseInfo, RouteRule,
};
pub use noop_sink::NoopSink;
pub use record::LogRecord;
pub use redact::{redact, RedactConfig};
pub use reporting::ErrorReporter;
pub use request::RequestSummary;
pub use sink::{LogSink, MemorySink, StdoutSink, Stream};
pub use trace::{SpanContext, TraceProvider};
pub use value::{Array, ErrorValue, Object, Value};

#[cfg(feature = "middleware")]
pub use service::{RequestLogLayer, RequestLogService};
