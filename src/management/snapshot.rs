use std::{path::PathBuf, sync::Mutex};

use async_trait::async_trait;

use crate::config;

/// Session-scoped string storage holding the serialized title snapshot.
///
/// Failures are never surfaced: an unreadable store behaves like an empty one
/// and a failed write simply leaves the previous snapshot in place.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn read(&self) -> Option<String>;
    async fn write(&self, raw: String);
    async fn remove(&self);
}

/// Keeps the snapshot for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    raw: Mutex<Option<String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.raw.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn read(&self) -> Option<String> {
        self.slot().clone()
    }

    async fn write(&self, raw: String) {
        *self.slot() = Some(raw);
    }

    async fn remove(&self) {
        self.slot().take();
    }
}

/// Persists the snapshot as a JSON file, by default under the local data directory.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/hymnsync/state/<key>.json`
    pub fn in_data_dir(key: &str) -> Self {
        let mut path = config::data_dir();
        path.push(format!("state/{key}.json"));
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn read(&self) -> Option<String> {
        async_fs::read_to_string(&self.path).await.ok()
    }

    async fn write(&self, raw: String) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = async_fs::create_dir_all(parent).await {
                tracing::warn!(path = %parent.display(), error = %e, "cannot create snapshot directory");
                return;
            }
        }
        if let Err(e) = async_fs::write(&self.path, raw).await {
            tracing::warn!(path = %self.path.display(), error = %e, "cannot write title snapshot");
        }
    }

    async fn remove(&self) {
        if let Err(e) = async_fs::remove_file(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot remove title snapshot");
            }
        }
    }
}
