pub mod error;
pub mod record;
pub mod caller;
pub mod field;
pub mod template;
pub mod store;
pub mod memory_store;
pub mod writer;
pub mod backend;
pub mod env;
pub mod config;
pub mod logger;
pub mod registry;

#[cfg(feature = "layer")]
pub mod layer;
#[cfg(feature = "layer")]
pub mod init;

pub use serde_json::Value;

pub use backend::{BackendKind, CsvBackend, LogBackend, TextBackend};
pub use config::{LoggerConfig, ValidationPolicy};
pub use error::{LogError, Result};
pub use logger::{FileLogger, LoggerBuilder};
pub use record::{LogRecord, Severity};
pub use registry::LoggerRegistry;
