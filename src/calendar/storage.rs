use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {key:?} from {}: {source}", .path.display())]
    Read {
        key: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {key:?} to {}: {source}", .path.display())]
    Write {
        key: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode {key:?}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
}

/// String key-value store that survives restarts.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                path,
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let write_err = |source: io::Error| StorageError::Write {
            key: key.to_string(),
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;

        // Write next to the target and rename so a crash never leaves half a file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(write_err)?;
        fs::rename(&tmp, &path).map_err(write_err)?;

        tracing::trace!(key, bytes = value.len(), "storage write");
        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemoryStorage;

#[cfg(test)]
mod memory {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::io;
    use std::rc::Rc;

    use super::{Storage, StorageError};

    /// In-memory storage whose clones share state, so tests can inspect
    /// what a store wrote after handing it a boxed copy.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryStorage {
        entries: Rc<RefCell<HashMap<String, String>>>,
        fail_writes: Rc<Cell<bool>>,
        writes: Rc<Cell<usize>>,
    }

    impl MemoryStorage {
        pub fn with_entry(key: &str, value: &str) -> Self {
            let storage = Self::default();
            storage
                .entries
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            storage
        }

        pub fn raw(&self, key: &str) -> Option<String> {
            self.entries.borrow().get(key).cloned()
        }

        pub fn writes(&self) -> usize {
            self.writes.get()
        }

        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.set(fail);
        }
    }

    impl Storage for MemoryStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.raw(key))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.fail_writes.get() {
                return Err(StorageError::Write {
                    key: key.to_string(),
                    path: "memory".into(),
                    source: io::Error::new(io::ErrorKind::Other, "disk full"),
                });
            }
            self.writes.set(self.writes.get() + 1);
            self.entries
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.get("events").unwrap().is_none());
    }

    #[test]
    fn set_then_get_round_trips_and_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("data");
        let mut storage = FileStorage::new(&nested);

        storage.set("events", "[]").unwrap();
        storage.set("events", "[1]").unwrap();

        assert_eq!(storage.get("events").unwrap().as_deref(), Some("[1]"));
        assert!(nested.join("events.json").exists());
        assert!(!nested.join("events.json.tmp").exists());
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(storage.get(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn write_into_a_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let mut storage = FileStorage::new(&blocker);
        assert!(matches!(
            storage.set("events", "[]"),
            Err(StorageError::Write { .. })
        ));
    }
}
