use file_log_sink::{log_entry, FileLogger, LoggerConfig, Severity};

/// Configure a logger purely from `FILE_LOG_*` variables, e.g.
///
/// ```text
/// FILE_LOG_DIR=/tmp/logs FILE_LOG_BACKEND=csv cargo run --example from_env
/// ```
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = LoggerConfig::from_env("from-env-demo")?;
    let logger = FileLogger::from_config(&config)?;

    log_entry!(logger, Severity::Info, "configured from environment")?;
    log_entry!(
        logger,
        Severity::Warning,
        "backend selected",
        serde_json::to_value(config.backend)?
    )?;

    println!("{:#?}", logger);
    Ok(())
}
