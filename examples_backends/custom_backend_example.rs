use std::sync::Arc;

use cloudlog::{args, init, BridgeConfig, LogSink, Logger, LoggerKind, SinkError, Stream};

/// Example of plugging in a custom transport by implementing the
/// `LogSink` trait directly. Imagine this ships lines to some
/// proprietary collector.
struct MyCollectorSink;

impl LogSink for MyCollectorSink {
    fn write(&self, stream: Stream, line: &str) -> Result<(), SinkError> {
        println!("[my-collector:{stream:?}] {line}");
        Ok(())
    }
}

fn main() -> Result<(), cloudlog::ConfigError> {
    let logger = Logger::builder(LoggerKind::Cloud)
        .sink(Arc::new(MyCollectorSink))
        .context(serde_json::json!({"service": "billing"}))
        .build()?;
    init::init(logger);

    // Plain `tracing` events reach the same logger.
    init::install_bridge(BridgeConfig::default())?;

    init::info(args!["custom backend example started"]);
    init::context(serde_json::json!({"invoice": 42})).warn(args!["payment %s", "retried"]);
    tracing::error!(db = "my-custom-db", "simulated error sent via the bridge");
    Ok(())
}
