#![cfg(feature = "layer")]

use std::fs;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use file_log_sink::caller::NoCallerInfo;
use file_log_sink::init::LayerConfig;
use file_log_sink::layer::EntryLayer;
use file_log_sink::{FileLogger, LoggerRegistry, TextBackend};
use tempfile::tempdir;
use tokio::time::{sleep, Duration};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

fn text_logger(source: &str, dir: &std::path::Path) -> Arc<FileLogger> {
    Arc::new(
        FileLogger::builder(source, Arc::new(TextBackend::new(dir)))
            .template("{type}|{caller}|{message}|{data}")
            .caller_info(Arc::new(NoCallerInfo))
            .build()
            .unwrap(),
    )
}

#[tokio::test]
async fn events_are_routed_to_registered_loggers() {
    let dir = tempdir().unwrap();
    let registry = Arc::new(LoggerRegistry::new());
    let api = text_logger("api", dir.path());
    let audit = text_logger("audit", dir.path());
    registry.register_logger("api", Arc::clone(&api));
    registry.register_logger("audit", Arc::clone(&audit));

    let config = LayerConfig {
        default_source: "api".to_string(),
        min_level: Level::WARN,
        enable_stdout: false,
        ..LayerConfig::default()
    };
    let (layer, handle) = EntryLayer::new(Arc::clone(&registry), &config);
    let total = Arc::clone(&layer.total_events);
    let enqueued = Arc::clone(&layer.enqueued_events);
    let failed = Arc::clone(&layer.failed_entries);

    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::error!(order = 7, "payment declined");
        tracing::warn!(caller = "billing:charge", "retrying");
        tracing::warn!(source = "audit", user = "bob", "login failed");
        tracing::warn!(source = "nowhere", "lost");
        tracing::info!("below threshold");
    });

    // Dropping the subscriber closes the channel; the task drains and exits.
    handle.await.unwrap();

    let api_lines: Vec<String> = fs::read_to_string(api.path())
        .unwrap()
        .lines()
        .skip(2)
        .map(str::to_string)
        .collect();
    assert_eq!(
        api_lines,
        vec![
            r#"error|layer|payment declined|{"order":7}"#.to_string(),
            "warning|billing:charge|retrying|".to_string(),
        ]
    );

    let audit_content = fs::read_to_string(audit.path()).unwrap();
    assert_eq!(
        audit_content.lines().last(),
        Some(r#"warning|layer|login failed|{"user":"bob"}"#)
    );

    assert_eq!(total.load(Ordering::Relaxed), 5);
    assert_eq!(enqueued.load(Ordering::Relaxed), 4);
    assert_eq!(failed.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn steady_traffic_is_written_before_the_layer_is_dropped() {
    let dir = tempdir().unwrap();
    let registry = Arc::new(LoggerRegistry::new());
    let api = text_logger("api", dir.path());
    registry.register_logger("api", Arc::clone(&api));

    let config = LayerConfig {
        default_source: "api".to_string(),
        min_level: Level::INFO,
        batch_size: 128,
        flush_interval: Duration::from_millis(100),
        enable_stdout: false,
        ..LayerConfig::default()
    };
    let (layer, handle) = EntryLayer::new(Arc::clone(&registry), &config);
    let guard = tracing::subscriber::set_default(Registry::default().with(layer));

    // Events arrive faster than the flush interval, so the batch never sits
    // idle for a full interval and never reaches `batch_size`.
    for i in 0..20 {
        tracing::info!(tick = i, "heartbeat");
        sleep(Duration::from_millis(30)).await;
    }

    let written = fs::read_to_string(api.path()).unwrap_or_default();
    let entries = written.lines().skip(2).count();
    assert!(entries > 0, "nothing written while events kept arriving");

    drop(guard);
    handle.await.unwrap();

    let written = fs::read_to_string(api.path()).unwrap();
    let lines: Vec<&str> = written.lines().skip(2).collect();
    assert_eq!(lines.len(), 20);
    assert_eq!(lines[0], r#"info|layer|heartbeat|{"tick":0}"#);
    assert_eq!(lines[19], r#"info|layer|heartbeat|{"tick":19}"#);
}
