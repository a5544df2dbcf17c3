use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LogError, Result};
use crate::field::{plain_text, FieldRegistry};
use crate::template::placeholders;

/// Line layout used when neither the backend nor the config says otherwise.
pub const DEFAULT_TEMPLATE: &str = "[{timestamp}] - {type} - {caller} - {message} - {data}";

/// Per-backend behavior a [`FileLogger`](crate::logger::FileLogger) is
/// parameterized by: where files live, what a new file starts with, how
/// "now" is written, and which extra fields records may carry.
pub trait LogBackend: Send + Sync {
    /// Log file path for a source (application/component) name.
    fn path_for_source(&self, source: &str) -> PathBuf;

    /// Text written once at the top of a freshly created file.
    fn generate_file_header(&self, source: &str, template: &str) -> String;

    /// Current time as it should appear in the `timestamp` field.
    fn render_timestamp(&self) -> String;

    /// Template used when the logger config does not override it.
    fn default_template(&self) -> &str {
        DEFAULT_TEMPLATE
    }

    /// Backend-specific optional fields.
    fn extra_fields(&self) -> FieldRegistry {
        FieldRegistry::new()
    }

    /// Frames between the logging call site and the first frame caller
    /// inference considers, for records arriving with an empty `caller`.
    fn caller_depth(&self) -> usize {
        0
    }

    /// Last step applied to each resolved value before it is substituted
    /// into the template. Backends with a delimited layout quote here.
    fn escape_field(&self, value: String) -> String {
        value
    }
}

/// Supported backend kinds that can be selected by name or config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Text,
    Csv,
}

/// Parse a backend name (`"text"`, `"csv"`), ignoring case.
pub fn parse_backend(name: &str) -> Result<BackendKind> {
    match name.trim().to_ascii_lowercase().as_str() {
        "text" | "txt" | "log" => Ok(BackendKind::Text),
        "csv" => Ok(BackendKind::Csv),
        _ => Err(LogError::UnknownBackend(name.to_string())),
    }
}

/// Build the backend implementation for `kind`, rooted at `log_dir`.
pub fn make_backend(kind: BackendKind, log_dir: impl Into<PathBuf>) -> Arc<dyn LogBackend> {
    match kind {
        BackendKind::Text => Arc::new(TextBackend::new(log_dir)),
        BackendKind::Csv => Arc::new(CsvBackend::new(log_dir)),
    }
}

fn file_stem(source: &str) -> String {
    source
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

/// Human-oriented `.log` files with a `#`-comment banner and local-time
/// timestamps.
///
/// Records may also carry a `pid` field; an empty value is filled with the
/// current process id.
#[derive(Debug, Clone)]
pub struct TextBackend {
    log_dir: PathBuf,
}

impl TextBackend {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }
}

impl LogBackend for TextBackend {
    fn path_for_source(&self, source: &str) -> PathBuf {
        self.log_dir.join(format!("{}.log", file_stem(source)))
    }

    fn generate_file_header(&self, source: &str, template: &str) -> String {
        format!(
            "# {} log, created {}\n# format: {}",
            source,
            self.render_timestamp(),
            template
        )
    }

    fn render_timestamp(&self) -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn extra_fields(&self) -> FieldRegistry {
        FieldRegistry::new().with("pid", |value| match plain_text(value) {
            pid if pid.is_empty() => std::process::id().to_string(),
            pid => pid,
        })
    }
}

/// `;`-separated `.csv` files whose header row names the template's
/// columns, with RFC 3339 UTC timestamps.
///
/// Values containing the separator, a double quote or a line break are
/// wrapped in double quotes with inner quotes doubled (RFC 4180).
///
/// Records may also carry a `thread` field; an empty value is filled with
/// the current thread's name (or id).
#[derive(Debug, Clone)]
pub struct CsvBackend {
    log_dir: PathBuf,
}

impl CsvBackend {
    pub const TEMPLATE: &'static str = "{timestamp};{type};{caller};{message};{data}";
    pub const SEPARATOR: char = ';';

    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }
}

impl LogBackend for CsvBackend {
    fn path_for_source(&self, source: &str) -> PathBuf {
        self.log_dir.join(format!("{}.csv", file_stem(source)))
    }

    fn generate_file_header(&self, _source: &str, template: &str) -> String {
        placeholders(template).join(&Self::SEPARATOR.to_string())
    }

    fn render_timestamp(&self) -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn default_template(&self) -> &str {
        Self::TEMPLATE
    }

    fn escape_field(&self, value: String) -> String {
        let needs_quotes = value
            .chars()
            .any(|c| c == Self::SEPARATOR || c == '"' || c == '\n' || c == '\r');
        if needs_quotes {
            format!("\"{}\"", value.replace('"', "\"\""))
        } else {
            value
        }
    }

    fn extra_fields(&self) -> FieldRegistry {
        FieldRegistry::new().with("thread", |value| match plain_text(value) {
            name if name.is_empty() => {
                let current = std::thread::current();
                current
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{:?}", current.id()))
            }
            name => name,
        })
    }
}
