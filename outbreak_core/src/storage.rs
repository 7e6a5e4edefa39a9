//! Per-user string key/value storage.
//!
//! Values are opaque strings; [`load_json`] and [`save_json`] layer JSON on
//! top. A value that fails to decode is reported as absent.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access store at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store at {path:?} is not a JSON object of strings: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode value for key `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Clone)]
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

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// A store persisted as one JSON object on disk. Every `set` rewrites the
/// file through a sibling temp file and a rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| {
                StorageError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        debug!(
            target: "outbreak::storage",
            path = %path.display(),
            keys = entries.len(),
            "store.opened"
        );
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, key: &str) -> Result<(), StorageError> {
        let io_err = |source: io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let encoded =
            serde_json::to_string_pretty(&self.entries).map_err(|source| StorageError::Encode {
                key: key.to_string(),
                source,
            })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encoded).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    /// On a failed write the in-memory entry is rolled back to match the disk.
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        let previous = self.entries.insert(key.to_string(), value);
        if let Err(err) = self.flush(key) {
            match previous {
                Some(previous) => self.entries.insert(key.to_string(), previous),
                None => self.entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }
}

/// Decode the JSON value under `key`. Missing and malformed values are both `None`.
pub fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!(target: "outbreak::storage", key, error = %err, "store.value_malformed");
            Ok(None)
        }
    }
}

pub fn save_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let encoded = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, encoded)
}
