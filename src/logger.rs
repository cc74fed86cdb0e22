use crate::dump::DEFAULT_DEPTH;
use crate::error::{ConfigError, SinkError};
use crate::level::{Level, MinLevel};
use crate::line_format::{local_now, stream_for, Clock, LineFormat, Palette};
use crate::printf::interpolate;
use crate::reconcile::{fields_of, merge, reconcile, Fields};
use crate::record::LogRecord;
use crate::reporting::{request_extra, ErrorReporter};
use crate::request::RequestSummary;
use crate::sink::{LogSink, StdoutSink, Stream};
use crate::trace::TraceProvider;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Logger variants. The set is closed; a variant is chosen once when the
/// logger is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerKind {
    /// Plain text lines.
    Console,
    /// Text lines with ANSI colors.
    Formatted,
    /// One JSON record per line.
    Cloud,
    /// Forwarded to an [`ErrorReporter`].
    Reporting,
}

impl LoggerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LoggerKind::Console => "console",
            LoggerKind::Formatted => "formatted",
            LoggerKind::Cloud => "cloud",
            LoggerKind::Reporting => "reporting",
        }
    }
}

impl FromStr for LoggerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console" => Ok(LoggerKind::Console),
            "formatted" => Ok(LoggerKind::Formatted),
            "cloud" => Ok(LoggerKind::Cloud),
            "reporting" => Ok(LoggerKind::Reporting),
            _ => Err(ConfigError::UnknownKind(s.to_string())),
        }
    }
}

enum Backend {
    Text {
        format: LineFormat,
        sink: Arc<dyn LogSink>,
    },
    Cloud {
        sink: Arc<dyn LogSink>,
        trace: Option<Arc<dyn TraceProvider>>,
    },
    Reporting {
        format: LineFormat,
        reporter: Arc<dyn ErrorReporter>,
    },
}

/// A logging handle.
///
/// Handles are cheap to clone. [`Logger::context`] returns a new handle
/// with merged fields and never touches the receiver; the backend is
/// shared, the options are per handle.
#[derive(Clone)]
pub struct Logger {
    kind: LoggerKind,
    backend: Arc<Backend>,
    min_level: MinLevel,
    depth: Option<usize>,
    context: Arc<Fields>,
}

impl Logger {
    pub fn builder(kind: LoggerKind) -> LoggerBuilder {
        LoggerBuilder::new(kind)
    }

    /// Plain console logger on stdout/stderr with the process-wide level.
    pub fn console() -> Logger {
        Self::text(LoggerKind::Console, Palette::Plain)
    }

    /// Colored console logger on stdout/stderr with the process-wide level.
    pub fn formatted() -> Logger {
        Self::text(LoggerKind::Formatted, Palette::Colored)
    }

    /// JSON logger on stdout with the process-wide level.
    pub fn cloud(trace: Option<Arc<dyn TraceProvider>>) -> Logger {
        Self::from_parts(
            LoggerKind::Cloud,
            Backend::Cloud {
                sink: Arc::new(StdoutSink),
                trace,
            },
            MinLevel::global(),
            Some(DEFAULT_DEPTH),
        )
    }

    fn text(kind: LoggerKind, palette: Palette) -> Logger {
        Self::from_parts(
            kind,
            Backend::Text {
                format: LineFormat::new(palette, local_now),
                sink: Arc::new(StdoutSink),
            },
            MinLevel::global(),
            Some(DEFAULT_DEPTH),
        )
    }

    fn from_parts(kind: LoggerKind, backend: Backend, min_level: MinLevel, depth: Option<usize>) -> Logger {
        Logger {
            kind,
            backend: Arc::new(backend),
            min_level,
            depth,
            context: Arc::new(Fields::new()),
        }
    }

    pub fn kind(&self) -> LoggerKind {
        self.kind
    }

    pub fn depth(&self) -> Option<usize> {
        self.depth
    }

    pub fn min_level(&self) -> &MinLevel {
        &self.min_level
    }

    pub fn context_fields(&self) -> &Fields {
        &self.context
    }

    /// New handle whose context is this handle's context merged with the
    /// keys of `fields` (an object, or an array keyed by index). The new
    /// keys win. `self` is unchanged.
    pub fn context(&self, fields: impl Into<Value>) -> Logger {
        let extra = fields_of(&fields.into());
        Logger {
            context: Arc::new(merge(&self.context, extra)),
            ..self.clone()
        }
    }

    /// Depth bound for complex values in subsequent calls on this handle.
    /// `None` removes the bound.
    pub fn set_inspect_depth(&mut self, depth: Option<usize>) {
        self.depth = depth;
    }

    pub fn trace(&self, args: Vec<Value>) {
        self.log(Level::Trace, args);
    }

    pub fn debug(&self, args: Vec<Value>) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: Vec<Value>) {
        self.log(Level::Info, args);
    }

    pub fn warn(&self, args: Vec<Value>) {
        self.log(Level::Warn, args);
    }

    pub fn error(&self, args: Vec<Value>) {
        self.log(Level::Error, args);
    }

    /// Render and emit one call. Calls below the minimum level are dropped
    /// before any formatting happens.
    pub fn log(&self, level: Level, args: Vec<Value>) {
        if !self.min_level.enabled(level) {
            return;
        }
        let args = interpolate(args, self.depth);
        self.write(level, &args);
    }

    /// Emit already-rendered text as the message. `%` sequences in `text`
    /// are kept as written.
    pub fn log_text(&self, level: Level, text: impl Into<String>) {
        if !self.min_level.enabled(level) {
            return;
        }
        self.write(level, &[Value::String(text.into())]);
    }

    fn write(&self, level: Level, args: &[Value]) {
        let payload = reconcile(args, self.depth);

        match &*self.backend {
            Backend::Text { format, sink } => {
                let line = format.line(level, payload.message.as_deref());
                write_line(sink.as_ref(), stream_for(level), &line);
            }
            Backend::Cloud { sink, trace } => {
                let record = LogRecord::new(level.severity(), payload.message)
                    .with_context(merge(&self.context, payload.fields));
                emit_record(sink.as_ref(), trace.as_deref(), record);
            }
            Backend::Reporting { format, reporter } => {
                let line = format.line(level, payload.message.as_deref());
                reporter.report(level, &line, &merge(&self.context, payload.fields));
            }
        }
    }

    /// Emit the record for a finished request at `info` (status below 500)
    /// or `error`.
    pub fn format_request(&self, summary: &RequestSummary) {
        let level = if summary.status < 500 {
            Level::Info
        } else {
            Level::Error
        };
        if !self.min_level.enabled(level) {
            return;
        }

        match &*self.backend {
            Backend::Text { format, sink } => {
                let line = format.line(level, Some(&format.request_line(summary)));
                write_line(sink.as_ref(), stream_for(level), &line);
            }
            Backend::Cloud { sink, trace } => {
                emit_record(sink.as_ref(), trace.as_deref(), summary.to_record());
            }
            Backend::Reporting { reporter, .. } => {
                let extra = request_extra(summary.user_id.as_deref(), summary.latency_ms, &summary.size);
                reporter.report(level, &summary.message(), &extra);
            }
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("kind", &self.kind)
            .field("min_level", &self.min_level)
            .field("depth", &self.depth)
            .field("context", &self.context)
            .finish()
    }
}

fn emit_record(sink: &dyn LogSink, trace: Option<&dyn TraceProvider>, mut record: LogRecord) {
    if let Some(extra) = trace.and_then(|t| t.trace_payload()) {
        record.merge_missing(extra);
    }
    write_line(sink, Stream::Log, &record.to_json());
}

fn write_line(sink: &dyn LogSink, stream: Stream, line: &str) {
    if let Err(err) = sink.write(stream, line) {
        report_sink_error(&err);
    }
}

fn report_sink_error(err: &SinkError) {
    tracing::warn!(target: "cloudlog::sink", error = %err, "failed to write log line");
}

/// Builder for [`Logger`].
pub struct LoggerBuilder {
    kind: LoggerKind,
    sink: Option<Arc<dyn LogSink>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    trace: Option<Arc<dyn TraceProvider>>,
    min_level: Option<MinLevel>,
    depth: Option<usize>,
    clock: Clock,
    context: Fields,
}

impl LoggerBuilder {
    pub fn new(kind: LoggerKind) -> Self {
        Self {
            kind,
            sink: None,
            reporter: None,
            trace: None,
            min_level: None,
            depth: Some(DEFAULT_DEPTH),
            clock: local_now,
            context: Fields::new(),
        }
    }

    /// Destination for rendered lines. Defaults to [`StdoutSink`].
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Required for [`LoggerKind::Reporting`], ignored otherwise.
    pub fn reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Trace identifiers merged into cloud records.
    pub fn trace_provider(mut self, trace: Arc<dyn TraceProvider>) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Minimum-level cell. Defaults to the process-wide cell.
    pub fn min_level(mut self, min_level: MinLevel) -> Self {
        self.min_level = Some(min_level);
        self
    }

    pub fn depth(mut self, depth: Option<usize>) -> Self {
        self.depth = depth;
        self
    }

    /// Clock for the date tag of text lines.
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Initial context fields.
    pub fn context(mut self, fields: impl Into<Value>) -> Self {
        self.context.extend(fields_of(&fields.into()));
        self
    }

    pub fn build(self) -> Result<Logger, ConfigError> {
        let sink = self.sink.unwrap_or_else(|| Arc::new(StdoutSink));
        let backend = match self.kind {
            LoggerKind::Console => Backend::Text {
                format: LineFormat::new(Palette::Plain, self.clock),
                sink,
            },
            LoggerKind::Formatted => Backend::Text {
                format: LineFormat::new(Palette::Colored, self.clock),
                sink,
            },
            LoggerKind::Cloud => Backend::Cloud {
                sink,
                trace: self.trace,
            },
            LoggerKind::Reporting => Backend::Reporting {
                format: LineFormat::new(Palette::Plain, self.clock),
                reporter: self.reporter.ok_or(ConfigError::MissingReporter)?,
            },
        };

        let mut logger = Logger::from_parts(
            self.kind,
            backend,
            self.min_level.unwrap_or_else(MinLevel::global),
            self.depth,
        );
        logger.context = Arc::new(self.context);
        Ok(logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::sink::MemorySink;
    use serde_json::json;

    fn cloud() -> (Logger, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::builder(LoggerKind::Cloud)
            .sink(sink.clone())
            .min_level(MinLevel::new(Level::Trace))
            .build()
            .unwrap();
        (logger, sink)
    }

    #[test]
    fn parses_kinds() {
        assert_eq!("Cloud".parse::<LoggerKind>().unwrap(), LoggerKind::Cloud);
        assert!(matches!(
            "syslog".parse::<LoggerKind>(),
            Err(ConfigError::UnknownKind(_))
        ));
    }

    #[test]
    fn reporting_requires_reporter() {
        let err = Logger::builder(LoggerKind::Reporting).build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingReporter));
    }

    #[test]
    fn context_does_not_mutate_parent() {
        let (logger, sink) = cloud();
        let child = logger.context(json!({"a": 1})).context(json!({"b": 2}));
        assert_eq!(serde_json::Value::Object(child.context_fields().clone()), json!({"a": 1, "b": 2}));
        assert!(logger.context_fields().is_empty());

        logger.info(args!["parent"]);
        assert_eq!(sink.records(), vec![json!({"severity": "INFO", "message": "parent"})]);
    }

    #[test]
    fn set_inspect_depth_is_per_handle() {
        let (mut logger, _sink) = cloud();
        let child = logger.context(json!({"a": 1}));
        logger.set_inspect_depth(Some(1));
        assert_eq!(logger.depth(), Some(1));
        assert_eq!(child.depth(), Some(DEFAULT_DEPTH));
    }

    #[test]
    fn builder_context_seeds_handle() {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::builder(LoggerKind::Cloud)
            .sink(sink.clone())
            .min_level(MinLevel::new(Level::Info))
            .context(json!({"service": "api"}))
            .build()
            .unwrap();
        logger.info(args!["up"]);
        assert_eq!(
            sink.records(),
            vec![json!({"severity": "INFO", "message": "up", "context": {"service": "api"}})]
        );
    }
}
