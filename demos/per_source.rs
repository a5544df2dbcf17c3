use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use file_log_sink::init::init_tracing;
use file_log_sink::{BackendKind, LoggerConfig, LoggerRegistry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = std::env::temp_dir().join("file-log-sink-demo");

    let registry = Arc::new(LoggerRegistry::new());
    registry.register_config(&LoggerConfig {
        log_dir: log_dir.clone(),
        ..LoggerConfig::new("auth-service")
    })?;
    registry.register_config(&LoggerConfig {
        log_dir: log_dir.clone(),
        backend: BackendKind::Csv,
        ..LoggerConfig::new("audit")
    })?;

    init_tracing(Arc::clone(&registry), "auth-service")?;

    info!("starting service");

    error!(
        user_id = 42,
        reason = "invalid password",
        "authentication failed"
    );
    warn!(source = "audit", user_id = 42, "account locked");

    sleep(Duration::from_secs(2)).await;
    registry.flush()?;

    for source in registry.sources() {
        if let Some(logger) = registry.get(&source) {
            println!("{source}: {}", logger.path().display());
        }
    }
    Ok(())
}
