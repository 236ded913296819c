//! Completion Flag Storage
//!
//! Hands the payment result from the checkout flow to the storefront
//! screen. The flag is written once on completion and cleared by the
//! read that consumes it, so a success can only ever be shown once.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

use crate::error::{FlowError, Result};

/// Key the completion flag is stored under
pub const STATUS_KEY: &str = "paymentStatus";

/// Value that marks a completed payment
pub const STATUS_SUCCESS: &str = "success";

/// Key-value storage for the completion flag
pub trait CompletionStore: Send + Sync {
    /// Record a completed payment
    fn record_success(&self) -> Result<()>;

    /// Read and clear the flag; true only when it held a success
    fn take_success(&self) -> Result<bool>;

    /// Read the flag without clearing it
    fn peek(&self) -> Result<Option<String>>;
}

/// In-memory store, gone on restart (for tests and previews)
pub struct MemoryCompletionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl Default for MemoryCompletionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCompletionStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl CompletionStore for MemoryCompletionStore {
    fn record_success(&self) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        entries.insert(STATUS_KEY.to_string(), STATUS_SUCCESS.to_string());
        Ok(())
    }

    fn take_success(&self) -> Result<bool> {
        let mut entries = self.entries.write().unwrap();
        Ok(entries.remove(STATUS_KEY).as_deref() == Some(STATUS_SUCCESS))
    }

    fn peek(&self) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap();
        Ok(entries.get(STATUS_KEY).cloned())
    }
}

/// File-backed store that survives app restarts.
///
/// The whole map is kept as one small JSON object; a missing or
/// unreadable file reads as empty rather than failing the flow.
pub struct FileCompletionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCompletionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> HashMap<String, String> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return HashMap::new();
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Discarding unreadable status file: {}", e);
                HashMap::new()
            }
        }
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<()> {
        let raw = serde_json::to_string(entries).map_err(|e| FlowError::Storage(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| FlowError::Storage(e.to_string()))
    }
}

impl CompletionStore for FileCompletionStore {
    fn record_success(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap();

        let mut entries = self.load();
        entries.insert(STATUS_KEY.to_string(), STATUS_SUCCESS.to_string());
        self.save(&entries)
    }

    fn take_success(&self) -> Result<bool> {
        let _guard = self.lock.lock().unwrap();

        let mut entries = self.load();
        let removed = entries.remove(STATUS_KEY);
        if removed.is_some() {
            self.save(&entries)?;
        }

        Ok(removed.as_deref() == Some(STATUS_SUCCESS))
    }

    fn peek(&self) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.load().get(STATUS_KEY).cloned())
    }
}
