use crate::async_sink::AsyncStdoutSink;
use crate::config::LogConfig;
use crate::error::ConfigError;
use crate::layer::{FacadeLayer, ENGINE_TARGET};
use crate::level::{self, Level, MinLevel};
use crate::logger::{Logger, LoggerKind};
use crate::request::RequestSummary;
use crate::trace::TraceProvider;
use crate::value::Value;
use arc_swap::ArcSwap;
use std::sync::{Arc, OnceLock};
use tokio::time::Duration;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::Registry;

// A call racing with a swap sees either the old or the new logger.
static ACTIVE: OnceLock<ArcSwap<Logger>> = OnceLock::new();

fn active() -> &'static ArcSwap<Logger> {
    ACTIVE.get_or_init(|| {
        let (logger, min_level) = default_logger(LogConfig::from_env());
        level::set_min_level(min_level);
        ArcSwap::from_pointee(logger)
    })
}

/// Logger and level for the lazily installed default.
///
/// # Panics
///
/// Panics when the logging environment is invalid. A bad `LOG_LEVEL` must
/// stop the process rather than fall back to a default level.
fn default_logger(config: Result<LogConfig, ConfigError>) -> (Logger, Level) {
    let config = config.unwrap_or_else(|err| panic!("invalid logging environment: {err}"));
    match config.logger() {
        Ok(logger) => (logger, config.min_level),
        Err(err) => panic!("invalid logging environment: {err}"),
    }
}

/// Make `logger` the active logger. The environment is not consulted.
pub fn init(logger: Logger) {
    let logger = Arc::new(logger);
    ACTIVE
        .get_or_init(|| ArcSwap::new(Arc::clone(&logger)))
        .store(logger);
}

/// Swap in `logger`, returning the logger it replaced.
pub fn replace(logger: Logger) -> Arc<Logger> {
    active().swap(Arc::new(logger))
}

/// The active logger. The first call without a prior [`init`] installs a
/// default built from [`LogConfig::from_env`], and panics if the
/// environment holds an invalid value.
pub fn current() -> Arc<Logger> {
    active().load_full()
}

pub fn use_console() {
    init(Logger::console());
}

pub fn use_formatted() {
    init(Logger::formatted());
}

pub fn use_cloud(trace: Option<Arc<dyn TraceProvider>>) {
    init(Logger::cloud(trace));
}

/// Set the depth bound of the active logger in place.
pub fn set_inspect_depth(depth: Option<usize>) {
    active().rcu(|logger| {
        let mut next = Logger::clone(logger);
        next.set_inspect_depth(depth);
        next
    });
}

/// Set the process-wide minimum level. Takes effect on the next call.
pub fn set_level(level: Level) {
    level::set_min_level(level);
}

pub fn level() -> Level {
    level::min_level()
}

pub fn trace(args: Vec<Value>) {
    active().load().trace(args);
}

pub fn debug(args: Vec<Value>) {
    active().load().debug(args);
}

pub fn info(args: Vec<Value>) {
    active().load().info(args);
}

pub fn warn(args: Vec<Value>) {
    active().load().warn(args);
}

pub fn error(args: Vec<Value>) {
    active().load().error(args);
}

pub fn format_request(summary: &RequestSummary) {
    active().load().format_request(summary);
}

/// Child of the active logger; see [`Logger::context`].
pub fn context(fields: impl Into<Value>) -> Logger {
    active().load().context(fields)
}

/// Configure the process from `LOG_LEVEL`, `LOG_FORMAT` and `LOG_DEPTH`.
///
/// Invalid values are returned as errors and leave the current state
/// untouched.
pub fn init_from_env() -> Result<(), ConfigError> {
    let config = LogConfig::from_env()?;
    init_with_config(&config)
}

/// Apply `config`: set the process-wide level and install a logger of the
/// configured kind.
///
/// Cloud loggers created inside a tokio runtime write through an
/// [`AsyncStdoutSink`] whose writer task runs for the life of the
/// runtime.
pub fn init_with_config(config: &LogConfig) -> Result<(), ConfigError> {
    let logger = if config.kind == LoggerKind::Cloud && tokio::runtime::Handle::try_current().is_ok() {
        let (sink, _writer) = AsyncStdoutSink::new(1024, 128, Duration::from_millis(100));
        Logger::builder(config.kind)
            .min_level(MinLevel::global())
            .depth(config.depth)
            .sink(Arc::new(sink))
            .build()?
    } else {
        config.logger()?
    };
    init(logger);
    level::set_min_level(config.min_level);
    tracing::debug!(
        target: "cloudlog::init",
        kind = config.kind.as_str(),
        level = %config.min_level,
        "logger installed"
    );
    Ok(())
}

/// Options for [`install_bridge`].
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    /// Forward to this logger instead of the active one.
    pub logger: Option<Logger>,
    /// Also print the crate's own diagnostics to stderr.
    pub diagnostics: bool,
}

/// Install a global `tracing` subscriber that forwards application events
/// to the facade.
pub fn install_bridge(config: BridgeConfig) -> Result<(), ConfigError> {
    let layer = FacadeLayer::new(config.logger);

    // Two subscriber shapes, one per optional fmt layer.
    let result = if config.diagnostics {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter_fn(|meta| meta.target().starts_with(ENGINE_TARGET)));
        tracing::subscriber::set_global_default(Registry::default().with(layer).with(fmt_layer))
    } else {
        tracing::subscriber::set_global_default(Registry::default().with(layer))
    };
    result.map_err(|err| ConfigError::Subscriber(err.to_string()))
}
