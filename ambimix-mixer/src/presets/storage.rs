//! Key-scoped preset storage
//!
//! The whole preset set is one JSON document stored under a single key.
//! Reads return the raw bytes; writes replace them entirely.

use crate::error::PersistenceError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Key the preset document is stored under
pub const STORAGE_KEY: &str = "ambientSoundMixer";

/// Durable byte storage for the preset document
pub trait PresetStorage: Send {
    /// Raw stored bytes, `None` when nothing has been stored yet
    fn read_all(&self) -> Result<Option<Vec<u8>>, PersistenceError>;

    /// Replace the stored bytes
    ///
    /// On failure the previously stored bytes must remain intact.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), PersistenceError>;
}

/// Storage backed by `<folder>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(folder: &Path, key: &str) -> Self {
        Self {
            path: folder.join(format!("{}.json", key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PresetStorage for FileStorage {
    fn read_all(&self) -> Result<Option<Vec<u8>>, PersistenceError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write beside the target then rename, so a failed write never
        // leaves a truncated document behind
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    bytes: Option<Vec<u8>>,
    fail_reads: bool,
    fail_writes: bool,
}

/// In-memory storage
///
/// Clones share the same bytes. Reads and writes can be switched to fail
/// to exercise the degradation paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with `bytes`
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let storage = Self::default();
        storage.lock().bytes = Some(bytes.into());
        storage
    }

    /// Currently stored bytes
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.lock().bytes.clone()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PresetStorage for MemoryStorage {
    fn read_all(&self) -> Result<Option<Vec<u8>>, PersistenceError> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(PersistenceError::Unavailable("reads disabled".to_string()));
        }
        Ok(inner.bytes.clone())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), PersistenceError> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(PersistenceError::Unavailable("writes disabled".to_string()));
        }
        inner.bytes = Some(bytes.to_vec());
        Ok(())
    }
}
