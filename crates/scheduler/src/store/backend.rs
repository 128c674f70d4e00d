//! Keyed storage backends: a JSON-file directory and an in-memory map.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

use tracing::warn;

use cadence_core::Result;

/// A synchronous keyed record store. One key maps to one serialized
/// collection; the engine does not interpret the payload here.
///
/// Implementations must tolerate concurrent readers from the embedding host,
/// but the engine itself is single-writer.
pub trait StorageBackend: Send + Sync {
    /// Read the raw payload for `key`. `Ok(None)` when the key is absent.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the payload for `key`.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Directory of `<key>.json` files with atomic replace-on-write.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if !dir.exists() {
            if let Err(e) = fs::create_dir_all(&dir) {
                warn!(path = %dir.display(), error = %e, "failed to create data directory");
            }
        }
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        // Write to a .tmp file first, then rename to the final path to
        // avoid partial writes on crash.
        let final_path = self.path_for(key);
        let tmp_path = self.dir.join(format!(".{}.tmp", key));
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory backend for tests and hosts that manage persistence themselves.
#[derive(Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let guard = self.records.read().expect("memory backend lock poisoned");
        Ok(guard.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.records.write().expect("memory backend lock poisoned");
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut guard = self.records.write().expect("memory backend lock poisoned");
        guard.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_round_trip() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.read("k").unwrap(), None);
        backend.write("k", "v").unwrap();
        assert_eq!(backend.read("k").unwrap(), Some("v".to_string()));
        backend.remove("k").unwrap();
        assert_eq!(backend.read("k").unwrap(), None);
    }

    #[test]
    fn memory_backend_remove_absent_key_is_ok() {
        let backend = MemoryBackend::new();
        backend.remove("missing").unwrap();
    }

    #[test]
    fn file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        assert_eq!(backend.read("schedules").unwrap(), None);
        backend.write("schedules", "[]").unwrap();
        assert_eq!(backend.read("schedules").unwrap(), Some("[]".to_string()));
        backend.remove("schedules").unwrap();
        assert_eq!(backend.read("schedules").unwrap(), None);
    }

    #[test]
    fn file_backend_overwrites_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        backend.write("k", "first").unwrap();
        backend.write("k", "second").unwrap();
        assert_eq!(backend.read("k").unwrap(), Some("second".to_string()));
        // No stray tmp files left behind.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn file_backend_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("engine");
        let backend = FileBackend::new(&nested);
        backend.write("k", "v").unwrap();
        assert!(nested.join("k.json").exists());
    }
}
