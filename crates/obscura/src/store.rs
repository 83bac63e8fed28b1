//! Settings persistence transport.
//!
//! The host persists the settings as an opaque JSON blob. [`SettingsStore`]
//! is the asynchronous load/save pair; writes are awaited by the caller
//! before any view is refreshed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Asynchronous load/save of the settings blob.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the stored blob, `None` when nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob exists but cannot be read or parsed.
    async fn load(&self) -> Result<Option<Value>>;

    /// Durably store the blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn save(&self, blob: &Value) -> Result<()>;
}

/// Stores the blob as pretty-printed JSON in a file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by `path`. Nothing is touched until the first
    /// load or save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn load(&self) -> Result<Option<Value>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}", self.path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(Error::SettingsRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let blob = serde_json::from_slice(&bytes)
            .map_err(|e| Error::settings_decode(format!("{}: {e}", self.path.display())))?;
        Ok(Some(blob))
    }

    async fn save(&self, blob: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| Error::DirectoryCreate {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        let json = serde_json::to_vec_pretty(blob)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| Error::SettingsWrite {
                path: self.path.clone(),
                source,
            })?;
        info!("Settings saved to {}", self.path.display());
        Ok(())
    }
}

/// Keeps the blob in memory. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: Mutex<Option<Value>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `blob`.
    #[must_use]
    pub fn with_blob(blob: Value) -> Self {
        Self {
            blob: Mutex::new(Some(blob)),
            saves: AtomicUsize::new(0),
        }
    }

    /// The blob last saved (or seeded).
    #[must_use]
    pub fn blob(&self) -> Option<Value> {
        self.blob.lock().ok().and_then(|guard| guard.clone())
    }

    /// Number of completed saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load(&self) -> Result<Option<Value>> {
        Ok(self.blob())
    }

    async fn save(&self, blob: &Value) -> Result<()> {
        let mut guard = self
            .blob
            .lock()
            .map_err(|_| Error::internal("settings store lock poisoned"))?;
        *guard = Some(blob.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
