use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::backend::{make_backend, LogBackend};
use crate::caller::{CallerInfo, StackCallerInfo};
use crate::config::{LoggerConfig, ValidationPolicy};
use crate::error::{LogError, Result};
use crate::field::{default_required, resolve, FieldRegistry, RenderedFields};
use crate::record::{LogRecord, Severity};
use crate::store::{FsStore, LogStore};
use crate::template::render;
use crate::writer::LogFileWriter;

/// Template-driven logger appending to a single file.
///
/// Configuration is fixed at construction; every [`add_entry`] call
/// validates the record, renders it through the template and appends the
/// line, creating the file with the backend's header on first write.
/// Calls block until the write finished, so sequential calls from one
/// thread land in call order.
///
/// [`add_entry`]: FileLogger::add_entry
pub struct FileLogger {
    source: String,
    path: PathBuf,
    template: String,
    required: FieldRegistry,
    optional: FieldRegistry,
    backend: Arc<dyn LogBackend>,
    writer: LogFileWriter,
    policy: ValidationPolicy,
    enabled: bool,
}

impl FileLogger {
    /// Start building a logger for `source` on top of `backend`.
    pub fn builder(source: impl Into<String>, backend: Arc<dyn LogBackend>) -> LoggerBuilder {
        LoggerBuilder::new(source, backend)
    }

    /// Build a filesystem logger from a [`LoggerConfig`].
    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        let backend = make_backend(config.backend, &config.log_dir);
        let mut builder = Self::builder(config.source.clone(), backend)
            .on_validation_error(config.on_validation_error)
            .enabled(config.enabled);
        if let Some(template) = &config.template {
            builder = builder.template(template.clone());
        }
        if let Some(depth) = config.caller_depth {
            builder = builder.caller_depth(depth);
        }
        builder.build()
    }

    /// Validate, render and append one record.
    ///
    /// **Returns**
    /// - `Ok(())` once the line (and header, for a new file) is written, or
    ///   immediately if the logger is disabled.
    /// - `Err(MissingRequiredField | UnknownField)` if the record does not
    ///   match this logger's fields; nothing is written. Under
    ///   [`ValidationPolicy::WriteAsEntry`] the error is written as an entry
    ///   instead.
    /// - `Err(WriteFailure)` if the file could not be written.
    pub fn add_entry(&self, record: LogRecord) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let fields = match resolve(&record, &self.required, &self.optional) {
            Ok(fields) => fields,
            Err(err) if err.is_validation() && self.policy == ValidationPolicy::WriteAsEntry => {
                tracing::warn!(source = %self.source, error = %err, "invalid log record written as entry");
                self.error_fields(err, record)?
            }
            Err(err) => return Err(err),
        };

        let is_new_file = !self.writer.file_exists(&self.path);
        let header = if is_new_file {
            self.backend
                .generate_file_header(&self.source, &self.template)
        } else {
            String::new()
        };

        let fields: RenderedFields = fields
            .into_iter()
            .map(|(name, value)| (name, self.backend.escape_field(value)))
            .collect();
        let line = render(&self.template, &fields);
        self.writer.write(&self.path, is_new_file, &header, &line)
    }

    fn error_fields(&self, err: LogError, record: LogRecord) -> Result<RenderedFields> {
        let offending: serde_json::Map<String, Value> = record.fields.into_iter().collect();
        let fallback =
            LogRecord::entry(Severity::Error, err.to_string()).with_data(Value::Object(offending));
        resolve(&fallback, &self.required, &self.optional)
    }

    pub fn info(&self, message: impl Into<String>, data: impl Into<Value>) -> Result<()> {
        self.add_entry(LogRecord::entry(Severity::Info, message).with_data(data))
    }

    pub fn warning(&self, message: impl Into<String>, data: impl Into<Value>) -> Result<()> {
        self.add_entry(LogRecord::entry(Severity::Warning, message).with_data(data))
    }

    pub fn error(&self, message: impl Into<String>, data: impl Into<Value>) -> Result<()> {
        self.add_entry(LogRecord::entry(Severity::Error, message).with_data(data))
    }

    /// Fields every record must carry.
    pub fn required_fields(&self) -> &FieldRegistry {
        &self.required
    }

    /// Fields a record may additionally carry.
    pub fn optional_fields(&self) -> &FieldRegistry {
        &self.optional
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Flush the underlying store.
    pub fn flush(&self) -> Result<()> {
        self.writer
            .store()
            .flush()
            .map_err(|source| LogError::WriteFailure {
                path: self.path.clone(),
                source,
            })
    }
}

impl fmt::Debug for FileLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLogger")
            .field("source", &self.source)
            .field("path", &self.path)
            .field("template", &self.template)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("policy", &self.policy)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Builder for [`FileLogger`]. Anything not set falls back to the
/// backend's defaults, the filesystem store and stack-based caller
/// inference.
pub struct LoggerBuilder {
    source: String,
    backend: Arc<dyn LogBackend>,
    path: Option<PathBuf>,
    template: Option<String>,
    store: Option<Arc<dyn LogStore>>,
    caller_info: Option<Arc<dyn CallerInfo>>,
    caller_depth: Option<usize>,
    optional: FieldRegistry,
    policy: ValidationPolicy,
    enabled: bool,
}

impl LoggerBuilder {
    pub fn new(source: impl Into<String>, backend: Arc<dyn LogBackend>) -> Self {
        Self {
            source: source.into(),
            backend,
            path: None,
            template: None,
            store: None,
            caller_info: None,
            caller_depth: None,
            optional: FieldRegistry::new(),
            policy: ValidationPolicy::default(),
            enabled: true,
        }
    }

    /// Write to `path` instead of the backend-derived one.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn store(mut self, store: Arc<dyn LogStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn caller_info(mut self, caller_info: Arc<dyn CallerInfo>) -> Self {
        self.caller_info = Some(caller_info);
        self
    }

    pub fn caller_depth(mut self, depth: usize) -> Self {
        self.caller_depth = Some(depth);
        self
    }

    /// Accept an extra optional field rendered by `renderer`.
    pub fn optional_field<F>(mut self, name: impl Into<String>, renderer: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.optional.insert(name, renderer);
        self
    }

    pub fn on_validation_error(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// **Returns**
    /// - `Err(LogError::DuplicateField)` if an optional field shadows a
    ///   required one or the backend and builder both define it.
    pub fn build(self) -> Result<FileLogger> {
        let clock = Arc::clone(&self.backend);
        let caller_info = self
            .caller_info
            .unwrap_or_else(|| Arc::new(StackCallerInfo));
        let depth = self
            .caller_depth
            .unwrap_or_else(|| self.backend.caller_depth());
        let required = default_required(move || clock.render_timestamp(), caller_info, depth);

        let mut optional = self.backend.extra_fields();
        optional.merge(self.optional)?;
        if let Some(name) = required.overlap(&optional) {
            return Err(LogError::DuplicateField(name.to_string()));
        }

        let path = self
            .path
            .unwrap_or_else(|| self.backend.path_for_source(&self.source));
        let template = self
            .template
            .unwrap_or_else(|| self.backend.default_template().to_string());
        let store = self.store.unwrap_or_else(|| Arc::new(FsStore));

        Ok(FileLogger {
            source: self.source,
            path,
            template,
            required,
            optional,
            backend: self.backend,
            writer: LogFileWriter::new(store),
            policy: self.policy,
            enabled: self.enabled,
        })
    }
}
