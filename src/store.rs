use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// How a [`LogStore`] should open the target before writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create the file; fail with `AlreadyExists` if it is already there.
    CreateNew,
    /// Append to an existing file.
    Append,
}

/// Storage a [`FileLogger`](crate::logger::FileLogger) writes through.
///
/// Implementations are responsible for getting a fully rendered chunk of
/// text onto the medium in one piece. The logger calls these methods inline
/// from `add_entry`, so they should block until the data is written.
pub trait LogStore: Send + Sync {
    /// Whether `path` already holds a log.
    fn exists(&self, path: &Path) -> bool;

    /// Write `content` to `path` in one operation.
    ///
    /// **Returns**
    /// - `Ok(())` once the whole chunk has been handed to the medium.
    /// - `Err(e)` with `e.kind() == AlreadyExists` when `mode` is
    ///   [`WriteMode::CreateNew`] and someone created the file first.
    /// - `Err(..)` for any other failure (permissions, disk full, bad path).
    fn write(&self, path: &Path, content: &str, mode: WriteMode) -> io::Result<()>;

    /// Flush any buffered data.
    ///
    /// Default implementation is a no-op.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Plain filesystem store.
///
/// Appends open the file, write the chunk with a single `write_all` and
/// close it again, so nothing is buffered between calls. A new file is
/// first written in full to a temporary file in the same directory and
/// then moved into place without replacing an existing file, so readers and
/// concurrent appenders never see it partially written. Parent directories
/// are created on demand.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FsStore {
    fn create_new(path: &Path, content: &str) -> io::Result<()> {
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };

        let mut staged = NamedTempFile::new_in(parent)?;
        staged.write_all(content.as_bytes())?;
        staged.persist_noclobber(path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl LogStore for FsStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn write(&self, path: &Path, content: &str, mode: WriteMode) -> io::Result<()> {
        match mode {
            WriteMode::CreateNew => Self::create_new(path, content),
            WriteMode::Append => {
                let mut file = OpenOptions::new().append(true).open(path)?;
                file.write_all(content.as_bytes())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_new_refuses_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("app.log");

        FsStore.write(&path, "head\n", WriteMode::CreateNew).unwrap();
        assert!(FsStore.exists(&path));

        let err = FsStore
            .write(&path, "again\n", WriteMode::CreateNew)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&path).unwrap(), "head\n");

        // The staged copy of the refused write is cleaned up.
        let entries = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn append_never_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");

        FsStore.write(&path, "one\n", WriteMode::CreateNew).unwrap();
        FsStore.write(&path, "two\n", WriteMode::Append).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn append_to_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = FsStore
            .write(&dir.path().join("gone.log"), "x\n", WriteMode::Append)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
