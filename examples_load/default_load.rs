use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;

use cloudlog::{args, AsyncStdoutSink, Level, Logger, LoggerKind, MinLevel, NoopSink};

#[tokio::main]
async fn main() {
    let n: u64 = 100_000;

    // Formatting cost alone.
    let logger = Logger::builder(LoggerKind::Cloud)
        .sink(Arc::new(NoopSink))
        .min_level(MinLevel::new(Level::Info))
        .build()
        .expect("cloud logger");
    let start = Instant::now();
    for i in 0..n {
        logger.error(args!["load test %d", i, json!({"iteration": i, "nested": {"deep": [1, 2, 3]}})]);
    }
    report("noop sink", n, start);

    // Through the async stdout transport, writing into a discarded buffer.
    let (sink, writer) = AsyncStdoutSink::with_writer(tokio::io::sink(), 4096, 256, Duration::from_millis(50));
    let dropped = Arc::clone(&sink.dropped_lines);
    let logger = Logger::builder(LoggerKind::Cloud)
        .sink(Arc::new(sink))
        .min_level(MinLevel::new(Level::Info))
        .build()
        .expect("cloud logger");
    let start = Instant::now();
    for i in 0..n {
        logger.error(args![json!({"iteration": i})]);
    }
    report("async sink", n, start);

    // Dropping the last handle closes the channel; the writer flushes and exits.
    drop(logger);
    let _ = writer.await;
    println!("async sink dropped {} lines", dropped.load(std::sync::atomic::Ordering::Relaxed));
}

fn report(label: &str, n: u64, start: Instant) {
    let elapsed = start.elapsed();
    println!(
        "{}: logged {} calls in {:?} (~{:.0} calls/s)",
        label,
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
