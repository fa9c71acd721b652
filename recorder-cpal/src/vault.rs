//! Filesystem-backed vault.

use std::fs;
use std::path::{Path, PathBuf};

use recorder_core::{RecorderError, Vault};

/// Persists vault-relative paths under a root directory, creating missing
/// parent directories on write.
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl Vault for FsVault {
    fn exists(&self, path: &str) -> Result<bool, RecorderError> {
        Ok(self.absolute(path).exists())
    }

    fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<(), RecorderError> {
        let target = self.absolute(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| RecorderError::StorageError(format!("failed to create directory: {}", e)))?;
        }
        fs::write(&target, bytes)
            .map_err(|e| RecorderError::StorageError(format!("failed to write {}: {}", target.display(), e)))
    }
}
