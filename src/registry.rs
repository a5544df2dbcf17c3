use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::config::LoggerConfig;
use crate::error::{LogError, Result};
use crate::logger::FileLogger;
use crate::record::LogRecord;

/// Explicit, shareable map from source name to [`FileLogger`].
///
/// Applications build one at startup, register a logger per source, pass
/// it (usually as `Arc<LoggerRegistry>`) to whatever logs, and call
/// [`flush`](LoggerRegistry::flush) on shutdown.
#[derive(Debug, Default)]
pub struct LoggerRegistry {
    loggers: RwLock<BTreeMap<String, Arc<FileLogger>>>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `logger` under `source`, returning the logger it replaced.
    pub fn register_logger(
        &self,
        source: impl Into<String>,
        logger: Arc<FileLogger>,
    ) -> Option<Arc<FileLogger>> {
        let source = source.into();
        tracing::debug!(%source, path = %logger.path().display(), "registered logger");
        match self.loggers.write() {
            Ok(mut loggers) => loggers.insert(source, logger),
            Err(poisoned) => poisoned.into_inner().insert(source, logger),
        }
    }

    /// Build a logger from `config` and register it under `config.source`.
    pub fn register_config(&self, config: &LoggerConfig) -> Result<Arc<FileLogger>> {
        let logger = Arc::new(FileLogger::from_config(config)?);
        self.register_logger(config.source.clone(), Arc::clone(&logger));
        Ok(logger)
    }

    pub fn get(&self, source: &str) -> Option<Arc<FileLogger>> {
        match self.loggers.read() {
            Ok(loggers) => loggers.get(source).cloned(),
            Err(poisoned) => poisoned.into_inner().get(source).cloned(),
        }
    }

    pub fn sources(&self) -> Vec<String> {
        match self.loggers.read() {
            Ok(loggers) => loggers.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        }
    }

    /// Forward `record` to the logger registered for `source`.
    ///
    /// **Returns**
    /// - `Err(LogError::UnknownSource)` if nothing is registered under
    ///   `source`; otherwise whatever [`FileLogger::add_entry`] returns.
    pub fn dispatch(&self, source: &str, record: LogRecord) -> Result<()> {
        let logger = self
            .get(source)
            .ok_or_else(|| LogError::UnknownSource(source.to_string()))?;
        logger.add_entry(record)
    }

    /// Flush every registered logger, reporting the first failure after
    /// trying all of them.
    pub fn flush(&self) -> Result<()> {
        let loggers: Vec<_> = match self.loggers.read() {
            Ok(loggers) => loggers.values().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().values().cloned().collect(),
        };

        let mut first_err = None;
        for logger in loggers {
            if let Err(e) = logger.flush() {
                tracing::debug!(source = logger.source(), error = %e, "flush failed");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
