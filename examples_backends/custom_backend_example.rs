use std::path::PathBuf;
use std::sync::Arc;

use file_log_sink::field::{plain_text, FieldRegistry};
use file_log_sink::{log_entry, FileLogger, LogBackend, LogRecord, Severity};
use serde_json::json;

/// Example of integrating a completely custom backend by implementing the
/// `LogBackend` trait directly. Imagine an appliance whose logs must live
/// under a fixed directory, start with a vendor banner and carry a
/// `request_id` column.
struct ApplianceBackend {
    root: PathBuf,
}

impl LogBackend for ApplianceBackend {
    fn path_for_source(&self, source: &str) -> PathBuf {
        self.root.join(source).join("current.log")
    }

    fn generate_file_header(&self, source: &str, template: &str) -> String {
        format!("=== appliance log: {source} ===\n=== layout: {template} ===")
    }

    fn render_timestamp(&self) -> String {
        chrono::Utc::now().format("%s").to_string()
    }

    fn default_template(&self) -> &str {
        "{timestamp} {type} [{request_id}] {caller}: {message} {data}"
    }

    fn extra_fields(&self) -> FieldRegistry {
        FieldRegistry::new().with("request_id", plain_text)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let root = std::env::temp_dir().join("file-log-sink-custom");
    let backend = Arc::new(ApplianceBackend { root });
    let logger = FileLogger::builder("gateway", backend).build()?;

    log_entry!(logger, Severity::Info, "custom backend example started")?;

    logger.add_entry(
        LogRecord::entry(Severity::Error, "upstream timed out")
            .with_field("request_id", "req-42")
            .with_data(json!({"upstream": "billing", "after_ms": 3000})),
    )?;

    println!("wrote {}", logger.path().display());
    Ok(())
}
