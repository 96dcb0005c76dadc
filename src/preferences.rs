//! Persisted UI preferences
//!
//! A small string key-value store. The dashboard keeps two keys in it:
//! `darkMode` (`"true"`/`"false"`) and `userId` (the session identifier).
//! Values are read once at open and written through on every change.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::DashboardError;
use crate::structured_logging::DashboardLogger;

pub const DARK_MODE_KEY: &str = "darkMode";
pub const USER_ID_KEY: &str = "userId";

/// Where preference values live between runs
pub trait PreferenceBackend: Send + Sync {
    fn load(&self) -> Result<BTreeMap<String, String>, DashboardError>;
    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), DashboardError>;
}

/// JSON object on disk, replaced atomically on save
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceBackend for FileBackend {
    fn load(&self) -> Result<BTreeMap<String, String>, DashboardError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), DashboardError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, values)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path)
            .map_err(|e| DashboardError::Storage(e.to_string()))?;
        Ok(())
    }
}

/// Process-local backend; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceBackend for MemoryBackend {
    fn load(&self) -> Result<BTreeMap<String, String>, DashboardError> {
        Ok(self.values.lock().clone())
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), DashboardError> {
        *self.values.lock() = values.clone();
        Ok(())
    }
}

struct StoreInner {
    backend: Box<dyn PreferenceBackend>,
    values: Mutex<BTreeMap<String, String>>,
}

/// Preference store shared by the session provider and the dashboard
#[derive(Clone)]
pub struct PreferenceStore {
    inner: Arc<StoreInner>,
    logger: DashboardLogger,
}

impl PreferenceStore {
    /// Open the store, starting empty if the backend cannot be read
    pub fn open(backend: impl PreferenceBackend + 'static) -> Self {
        let logger = DashboardLogger::detached();
        let values = match backend.load() {
            Ok(values) => values,
            Err(e) => {
                logger.log_preference_failure("*", &e.to_string());
                BTreeMap::new()
            }
        };
        Self {
            inner: Arc::new(StoreInner {
                backend: Box::new(backend),
                values: Mutex::new(values),
            }),
            logger,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::open(FileBackend::new(path))
    }

    pub fn in_memory() -> Self {
        Self::open(MemoryBackend::new())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.values.lock().get(key).cloned()
    }

    /// Update `key` in memory, then persist. On a persist failure the
    /// in-memory value stays and the error is returned.
    ///
    /// The lock is held through the save so the backend always ends up with
    /// the latest values.
    pub fn set(&self, key: &str, value: &str) -> Result<(), DashboardError> {
        let mut values = self.inner.values.lock();
        if values.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        values.insert(key.to_string(), value.to_string());
        self.inner.backend.save(&values)
    }

    /// Return the non-empty value of `key`, or store and return `init()`.
    /// Lookup and insert happen under one lock, so concurrent callers all see
    /// the same value. A failed save is logged; the value stays in memory.
    pub fn get_or_insert_with<F>(&self, key: &str, init: F) -> String
    where
        F: FnOnce() -> String,
    {
        let mut values = self.inner.values.lock();
        if let Some(existing) = values.get(key).filter(|v| !v.is_empty()) {
            return existing.clone();
        }
        let value = init();
        values.insert(key.to_string(), value.clone());
        if let Err(e) = self.inner.backend.save(&values) {
            self.logger.log_preference_failure(key, &e.to_string());
        }
        value
    }

    /// Like `set`, but failures are only logged
    pub fn set_or_log(&self, key: &str, value: &str) {
        if let Err(e) = self.set(key, value) {
            self.logger.log_preference_failure(key, &e.to_string());
        }
    }

    /// Anything other than a stored `"true"` reads as off
    pub fn dark_mode(&self) -> bool {
        self.get(DARK_MODE_KEY).as_deref() == Some("true")
    }

    pub fn set_dark_mode(&self, enabled: bool) {
        self.set_or_log(DARK_MODE_KEY, if enabled { "true" } else { "false" });
    }
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("values", &*self.inner.values.lock())
            .finish()
    }
}
