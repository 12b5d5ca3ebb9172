//! File-based storage implementation

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::application::errors::StorageError;
use crate::domain::entities::CounterMap;
use crate::domain::traits::CounterStore;

/// JSON file holding every channel counter
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CounterStore for JsonFileStore {
    fn load(&self) -> Result<CounterMap, StorageError> {
        if !self.path.is_file() {
            tracing::info!("No counter file at {}, starting empty", self.path.display());
            return Ok(CounterMap::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(CounterMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, counters: &CounterMap) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target and rename so a crash never leaves half a file
        let tmp = self.temp_path();
        fs::write(&tmp, serde_json::to_vec(counters)?)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!("Saved {} counter(s) to {}", counters.len(), self.path.display());
        Ok(())
    }
}

/// Volatile store, shared between clones
#[derive(Clone, Default)]
pub struct MemoryStore {
    counters: Arc<Mutex<CounterMap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counters(counters: CounterMap) -> Self {
        Self {
            counters: Arc::new(Mutex::new(counters)),
        }
    }

    /// Copy of what was last saved
    pub fn snapshot(&self) -> CounterMap {
        self.counters.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl CounterStore for MemoryStore {
    fn load(&self) -> Result<CounterMap, StorageError> {
        Ok(self.snapshot())
    }

    fn save(&self, counters: &CounterMap) -> Result<(), StorageError> {
        let mut stored = self.counters.lock()
            .map_err(|_| StorageError::Serialization("Lock poisoned".to_string()))?;
        *stored = counters.clone();
        Ok(())
    }
}
