use crate::error::{LogError, Result};
use crate::store::{LogStore, WriteMode};
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Puts rendered lines into a log file, prefixing a header when the file is
/// created.
#[derive(Clone)]
pub struct LogFileWriter {
    store: Arc<dyn LogStore>,
}

impl LogFileWriter {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn LogStore> {
        &self.store
    }

    pub fn file_exists(&self, path: &Path) -> bool {
        self.store.exists(path)
    }

    /// Write `body` to `path`.
    ///
    /// With `is_new_file` the file is created holding `header` followed by
    /// `body`, in a single write. If another writer created the file since
    /// the caller checked, only `body` is appended so the header appears
    /// once. Otherwise `body` is appended to the existing file.
    pub fn write(&self, path: &Path, is_new_file: bool, header: &str, body: &str) -> Result<()> {
        let result = if is_new_file {
            match self
                .store
                .write(path, &with_header(header, body), WriteMode::CreateNew)
            {
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(path = %path.display(), "log file created concurrently, appending");
                    self.store.write(path, body, WriteMode::Append)
                }
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "created log file");
                    Ok(())
                }
                other => other,
            }
        } else {
            self.store.write(path, body, WriteMode::Append)
        };

        result.map_err(|source| LogError::WriteFailure {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn with_header(header: &str, body: &str) -> String {
    let mut content = String::with_capacity(header.len() + body.len() + 1);
    content.push_str(header);
    if !header.is_empty() && !header.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(body);
    content
}
