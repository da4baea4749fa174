use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed for '{key}': {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },

    #[error("store entry '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable string key-value storage that outlives one page load.
pub trait SnapshotStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

// ============================================================================
// Directory-backed store
// ============================================================================

/// One JSON file per key. File names are the SHA-1 of the key so any key
/// is a safe file name; the key itself is kept inside the file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    key: String,
    value: String,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut hasher = Sha1::new();
        hasher.update(key.as_bytes());
        self.dir.join(format!("{:x}.json", hasher.finalize()))
    }

    fn read_entry(&self, path: &Path, key: &str) -> Result<FileEntry, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            key: key.to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })
    }
}

impl SnapshotStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.read_entry(&path, key)?.value))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let entry = FileEntry {
            key: key.to_string(),
            value: value.to_string(),
        };
        let json = serde_json::to_string(&entry).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        fs::write(self.path_for(key), json).map_err(|source| StoreError::Io {
            key: key.to_string(),
            source,
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let listing = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            key: self.dir.display().to_string(),
            source,
        })?;
        let mut keys = Vec::new();
        for entry in listing {
            let entry = entry.map_err(|source| StoreError::Io {
                key: self.dir.display().to_string(),
                source,
            })?;
            let path = entry.path();
            if path.extension().map_or(false, |e| e == "json") {
                let name = path.display().to_string();
                match self.read_entry(&path, &name) {
                    Ok(stored) => keys.push(stored.key),
                    Err(e) => warn!(error = %e, "skipping unreadable store entry"),
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
