use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

/// Minimal durable store contract used by the session manager.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove_all(&self, keys: &[&str]) -> AppResult<()>;

    /// Write several entries. Backends that can commit them together should override this.
    fn set_many(&self, entries: &[(&str, &str)]) -> AppResult<()> {
        for (k, v) in entries {
            self.set(k, v)?;
        }
        Ok(())
    }
}

/// In-memory store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.map.read().len() }

    pub fn is_empty(&self) -> bool { self.map.read().is_empty() }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.map.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> AppResult<()> {
        let mut m = self.map.write();
        for k in keys {
            m.remove(*k);
        }
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> AppResult<()> {
        let mut m = self.map.write();
        for (k, v) in entries {
            m.insert(k.to_string(), v.to_string());
        }
        Ok(())
    }
}

/// JSON-file backed store. The whole map is cached in memory and the file is rewritten
/// (temp file + rename) after every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    map: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store; an unreadable or
    /// corrupt one is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<BTreeMap<String, String>>(&bytes) {
                Ok(m) => m,
                Err(e) => {
                    warn!(target: "lostfound::store", "ignoring corrupt store file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(target: "lostfound::store", "cannot read store file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        debug!(target: "lostfound::store", "opened {} keys={}", path.display(), map.len());
        Self { path, map: RwLock::new(map) }
    }

    pub fn path(&self) -> &Path { &self.path }

    fn flush(&self, map: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)
            .map_err(|e| AppError::storage("store_write", format!("{}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| AppError::storage("store_write", format!("{}: {}", self.path.display(), e)))?;
        Ok(())
    }

    // Apply `f` to a copy and only commit it to memory once the file write succeeded.
    fn mutate<F: FnOnce(&mut BTreeMap<String, String>)>(&self, f: F) -> AppResult<()> {
        let mut guard = self.map.write();
        let mut next = guard.clone();
        f(&mut next);
        self.flush(&next)?;
        *guard = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.mutate(|m| { m.insert(key.to_string(), value.to_string()); })
    }

    fn remove_all(&self, keys: &[&str]) -> AppResult<()> {
        self.mutate(|m| {
            for k in keys {
                m.remove(*k);
            }
        })
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> AppResult<()> {
        self.mutate(|m| {
            for (k, v) in entries {
                m.insert(k.to_string(), v.to_string());
            }
        })
    }
}
