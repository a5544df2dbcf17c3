use std::io;
use std::path::PathBuf;

/// Result type for logger operations.
pub type Result<T> = std::result::Result<T, LogError>;

/// Errors surfaced by [`FileLogger`](crate::logger::FileLogger) and the
/// surrounding registry/config helpers.
#[derive(thiserror::Error, Debug)]
pub enum LogError {
    /// A field every record must carry is absent.
    #[error("missing required field `{0}`")]
    MissingRequiredField(String),

    /// The record carries a field this logger does not know how to render.
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// The underlying storage write did not succeed.
    #[error("cannot write to log file {}: {source}", .path.display())]
    WriteFailure {
        /// Target log file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The same field name was registered as both required and optional.
    #[error("field `{0}` registered more than once")]
    DuplicateField(String),

    /// No logger is registered for the source.
    #[error("no logger registered for source `{0}`")]
    UnknownSource(String),

    /// Backend name could not be parsed.
    #[error("unknown or unsupported backend `{0}`")]
    UnknownBackend(String),
}

impl LogError {
    /// `true` for errors caused by the shape of the record itself, i.e. the
    /// ones a validation policy may turn into a written entry.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LogError::MissingRequiredField(_) | LogError::UnknownField(_)
        )
    }
}
