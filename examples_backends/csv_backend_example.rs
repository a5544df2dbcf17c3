use file_log_sink::{BackendKind, FileLogger, LoggerConfig, ValidationPolicy};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = LoggerConfig {
        log_dir: std::env::temp_dir().join("file-log-sink-csv"),
        backend: BackendKind::Csv,
        template: Some("{timestamp};{type};{thread};{caller};{message};{data}".to_string()),
        on_validation_error: ValidationPolicy::WriteAsEntry,
        ..LoggerConfig::new("orders")
    };
    let logger = FileLogger::from_config(&config)?;

    logger.info("order received", json!({"id": 1001, "items": 3}))?;
    logger.warning("stock low", json!({"sku": "A-17", "left": 2}))?;

    // Missing `data`: written as an error row instead of failing.
    let record = file_log_sink::LogRecord::new()
        .with_field("timestamp", "")
        .with_field("type", "error")
        .with_field("caller", "")
        .with_field("message", "incomplete record");
    logger.add_entry(record)?;

    println!("wrote {}", logger.path().display());
    Ok(())
}
