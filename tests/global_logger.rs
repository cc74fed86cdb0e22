//! Cases that touch the process-wide logger and level. They share state,
//! so each one holds `LOCK` for its whole body.

use cloudlog::{
    args, init, Environment, FacadeLayer, Level, LogConfig, Logger, LoggerKind, MemorySink, RequestSummary,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::layer::SubscriberExt;

static LOCK: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Install a cloud logger on the global level cell, writing to memory.
fn install() -> Arc<MemorySink> {
    let sink = Arc::new(MemorySink::new());
    let logger = Logger::builder(LoggerKind::Cloud).sink(sink.clone()).build().unwrap();
    init::init(logger);
    init::set_level(Level::Info);
    sink
}

#[test]
fn free_functions_use_the_active_logger() {
    let _guard = serial();
    let sink = install();

    init::info(args!["hello %s", "world"]);
    init::debug(args!["filtered at info"]);
    init::context(json!({"request": 1})).warn(args!["slow"]);
    init::format_request(&RequestSummary::new("GET", "/", 200, 3));

    let records = sink.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0], json!({"severity": "INFO", "message": "hello world"}));
    assert_eq!(
        records[1],
        json!({"severity": "WARNING", "message": "slow", "context": {"request": 1}})
    );
    assert_eq!(records[2]["message"], json!("GET / 0B - 3ms"));
}

#[test]
fn level_changes_apply_immediately() {
    let _guard = serial();
    let sink = install();

    init::set_level(Level::Debug);
    assert_eq!(init::level(), Level::Debug);
    init::debug(args!["visible"]);
    init::set_level(Level::Error);
    init::warn(args!["hidden"]);
    init::set_level(Level::Info);

    let messages: Vec<_> = sink.records().into_iter().map(|r| r["message"].clone()).collect();
    assert_eq!(messages, vec![json!("visible")]);
}

#[test]
fn replace_swaps_atomically() {
    let _guard = serial();
    let first = install();
    let second = Arc::new(MemorySink::new());

    let previous = init::replace(Logger::builder(LoggerKind::Cloud).sink(second.clone()).build().unwrap());
    previous.info(args!["old"]);
    init::info(args!["new"]);

    assert_eq!(first.records()[0]["message"], json!("old"));
    assert_eq!(second.records()[0]["message"], json!("new"));
}

#[test]
fn set_inspect_depth_updates_the_active_logger() {
    let _guard = serial();
    let sink = install();

    init::set_inspect_depth(Some(1));
    assert_eq!(init::current().depth(), Some(1));
    init::info(args![json!({"a": {"b": 1}})]);
    init::set_inspect_depth(Some(3));

    assert_eq!(sink.records()[0]["message"], json!("{ a: [Object] }"));
}

#[test]
fn config_selects_kind_and_depth() {
    let _guard = serial();
    let lookup = |key: &str| match key {
        "LOG_LEVEL" => Some("warn".to_string()),
        "LOG_FORMAT" => Some("console".to_string()),
        "LOG_DEPTH" => Some("5".to_string()),
        _ => None,
    };
    let config = LogConfig::from_lookup(Environment::Cloud, lookup).unwrap();
    init::init_with_config(&config).unwrap();

    let active = init::current();
    assert_eq!(active.kind(), LoggerKind::Console);
    assert_eq!(active.depth(), Some(5));
    assert_eq!(init::level(), Level::Warn);
    init::set_level(Level::Info);
}

#[test]
fn invalid_config_leaves_state_untouched() {
    let _guard = serial();
    let sink = install();

    let err = LogConfig::from_lookup(Environment::Cloud, |key: &str| {
        (key == "LOG_LEVEL").then(|| "loud".to_string())
    });
    assert!(err.is_err());

    init::info(args!["still here"]);
    assert_eq!(sink.records().len(), 1);
    assert_eq!(init::level(), Level::Info);
}

#[test]
fn bridge_follows_the_active_logger() {
    let _guard = serial();
    let sink = install();

    let subscriber = tracing_subscriber::registry().with(FacadeLayer::new(None));
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(order = 42, "order placed");
    });

    assert_eq!(
        sink.records(),
        vec![json!({"severity": "INFO", "message": "order placed", "context": {"order": 42}})]
    );
}
