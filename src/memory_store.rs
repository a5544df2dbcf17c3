use crate::store::{LogStore, WriteMode};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A store that keeps every "file" in memory.
///
/// Useful for unit tests that don't want to touch the filesystem, and for
/// simulating write failures with [`MemoryStore::fail_writes`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<PathBuf, String>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (`true`) or succeed again (`false`).
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// Current content of `path`, if it was ever written.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files
            .lock()
            .ok()
            .and_then(|files| files.get(path.as_ref()).cloned())
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "memory store lock poisoned")
}

impl LogStore for MemoryStore {
    fn exists(&self, path: &Path) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }

    fn write(&self, path: &Path, content: &str, mode: WriteMode) -> io::Result<()> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated write failure"));
        }

        let mut files = self.files.lock().map_err(|_| poisoned())?;
        match mode {
            WriteMode::CreateNew => {
                if files.contains_key(path) {
                    return Err(io::Error::new(io::ErrorKind::AlreadyExists, "file exists"));
                }
                files.insert(path.to_path_buf(), content.to_string());
            }
            WriteMode::Append => match files.get_mut(path) {
                Some(existing) => existing.push_str(content),
                None => return Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
            },
        }
        Ok(())
    }
}
