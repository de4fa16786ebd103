//! Project state persistence
//!
//! One JSON document per store, one project per store. The file store
//! writes through a temp file and renames so readers only ever see
//! committed snapshots. A missing file on load means first run.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::domain::ProjectState;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store poisoned")]
    Poisoned,
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Load the committed snapshot, or None on first run.
    async fn load(&self) -> Result<Option<ProjectState>, StoreError>;

    /// Durably write the full state document.
    async fn save(&self, state: &ProjectState) -> Result<(), StoreError>;
}

/// File-backed store: the whole ProjectState as one JSON document.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ProjectStore for JsonFileStore {
    async fn load(&self) -> Result<Option<ProjectState>, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => {
                let state = serde_json::from_str(&content)?;
                Ok(Some(state))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file; first run");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, state: &ProjectState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(state)?;
        let temp = self.temp_path();
        fs::write(&temp, content).await?;
        fs::rename(&temp, &self.path).await?;

        debug!(path = %self.path.display(), version = state.version, "state saved");
        Ok(())
    }
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<Option<ProjectState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn load(&self) -> Result<Option<ProjectState>, StoreError> {
        self.state
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| StoreError::Poisoned)
    }

    async fn save(&self, state: &ProjectState) -> Result<(), StoreError> {
        self.state
            .write()
            .map(|mut guard| *guard = Some(state.clone()))
            .map_err(|_| StoreError::Poisoned)
    }
}
