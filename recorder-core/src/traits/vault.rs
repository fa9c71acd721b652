use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::models::error::RecorderError;

/// Persistence collaborator. Paths are vault-relative strings; the caller
/// serializes calls, so no concurrent writers are assumed.
pub trait Vault: Send + Sync {
    fn exists(&self, path: &str) -> Result<bool, RecorderError>;

    fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<(), RecorderError>;
}

/// Document-insertion collaborator. A no-op when no document is focused.
pub trait NoteSink: Send + Sync {
    fn insert_at_cursor(&self, text: &str);
}

/// `NoteSink` for hosts without an active document.
pub struct NullNoteSink;

impl NoteSink for NullNoteSink {
    fn insert_at_cursor(&self, _text: &str) {}
}

/// In-memory vault for tests and embedding hosts that manage persistence
/// themselves.
#[derive(Default)]
pub struct MemoryVault {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a path, e.g. to exercise collision handling.
    pub fn insert(&self, path: &str, bytes: Vec<u8>) {
        self.files.lock().insert(path.to_string(), bytes);
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

impl Vault for MemoryVault {
    fn exists(&self, path: &str) -> Result<bool, RecorderError> {
        Ok(self.files.lock().contains_key(path))
    }

    fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<(), RecorderError> {
        self.files.lock().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}
