use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;
use tracing::error;

use file_log_sink::caller::NoCallerInfo;
use file_log_sink::init::{init_tracing_with_config, LayerConfig};
use file_log_sink::{FileLogger, LoggerRegistry, TextBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("file-log-sink-layer-load");
    let registry = Arc::new(LoggerRegistry::new());
    registry.register_logger(
        "load",
        Arc::new(
            FileLogger::builder("load", Arc::new(TextBackend::new(&dir)))
                .caller_info(Arc::new(NoCallerInfo))
                .build()?,
        ),
    );

    let layer_config = LayerConfig {
        default_source: "load".to_string(),
        channel_buffer: 50_000,
        batch_size: 1_000,
        flush_interval: Duration::from_millis(200),
        enable_stdout: false,
        ..LayerConfig::default()
    };

    init_tracing_with_config(Arc::clone(&registry), layer_config)?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "layer load test error");
    }

    let elapsed = start.elapsed();
    println!("layer: emitted {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give background task a little time to drain the channel
    tokio::time::sleep(Duration::from_secs(2)).await;
    registry.flush()?;
    Ok(())
}
