use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::backend::{parse_backend, BackendKind};
use crate::env::{
    env_opt, env_or, parse_flag, FILE_LOG_BACKEND_ENV, FILE_LOG_DIR_ENV, FILE_LOG_ENABLED_ENV,
    FILE_LOG_TEMPLATE_ENV,
};
use crate::error::Result;

/// What a logger does with a record that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Return the error to the caller and write nothing.
    #[default]
    Propagate,
    /// Write the error itself as an `error` entry (offending record in
    /// `data`) and report success.
    WriteAsEntry,
}

/// Configuration for a single logger.
///
/// **Fields**
/// - `source`: name of the application/component; the backend derives the
///   file name from it.
/// - `log_dir`: directory log files are created in.
/// - `backend`: which [`LogBackend`](crate::backend::LogBackend) formats the
///   file.
/// - `template`: line template; `None` uses the backend's default.
/// - `caller_depth`: frame offset for caller inference; `None` uses the
///   backend's value.
/// - `on_validation_error`: see [`ValidationPolicy`].
/// - `enabled`: if `false`, entries are accepted and dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub source: String,
    pub log_dir: PathBuf,
    pub backend: BackendKind,
    pub template: Option<String>,
    pub caller_depth: Option<usize>,
    pub on_validation_error: ValidationPolicy,
    pub enabled: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            source: "app".to_string(),
            log_dir: PathBuf::from("logs"),
            backend: BackendKind::Text,
            template: None,
            caller_depth: None,
            on_validation_error: ValidationPolicy::Propagate,
            enabled: true,
        }
    }
}

impl LoggerConfig {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Build a config for `source` from the `FILE_LOG_*` variables in
    /// [`crate::env`], falling back to defaults.
    ///
    /// **Returns**
    /// - `Err(LogError::UnknownBackend)` if `FILE_LOG_BACKEND` names no
    ///   known backend.
    pub fn from_env(source: impl Into<String>) -> Result<Self> {
        let defaults = Self::new(source);
        let log_dir = env_or(FILE_LOG_DIR_ENV, &defaults.log_dir.to_string_lossy());
        let backend = match env_opt(FILE_LOG_BACKEND_ENV) {
            Some(name) => parse_backend(&name)?,
            None => defaults.backend,
        };

        Ok(Self {
            log_dir: PathBuf::from(log_dir),
            backend,
            template: env_opt(FILE_LOG_TEMPLATE_ENV),
            enabled: env_opt(FILE_LOG_ENABLED_ENV)
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            ..defaults
        })
    }
}
