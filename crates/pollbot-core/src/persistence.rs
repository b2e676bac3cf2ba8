use pollbot_models::snapshot::Snapshot;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::CoreError;

/// Full-snapshot persistence for the poll store.
#[allow(async_fn_in_trait)]
pub trait SnapshotBackend: Send + Sync {
    /// Read the last saved snapshot. `None` when nothing was ever saved.
    async fn load(&self) -> Result<Option<Snapshot>, CoreError>;

    /// Replace the saved snapshot.
    async fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError>;
}

/// Enum-dispatch wrapper so the store can hold either backend without boxing.
#[derive(Clone)]
pub enum SnapshotMedium {
    File(JsonFileMedium),
    Memory(MemoryMedium),
}

impl SnapshotMedium {
    pub async fn load(&self) -> Result<Option<Snapshot>, CoreError> {
        match self {
            SnapshotMedium::File(m) => m.load().await,
            SnapshotMedium::Memory(m) => m.load().await,
        }
    }

    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        match self {
            SnapshotMedium::File(m) => m.save(snapshot).await,
            SnapshotMedium::Memory(m) => m.save(snapshot).await,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SnapshotMedium::File(m) => format!("file {}", m.path.display()),
            SnapshotMedium::Memory(_) => "memory (not durable)".to_string(),
        }
    }
}

// ── JSON file backend ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct JsonFileMedium {
    path: PathBuf,
}

impl JsonFileMedium {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotBackend for JsonFileMedium {
    async fn load(&self) -> Result<Option<Snapshot>, CoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CoreError::Persistence(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        let snapshot = serde_json::from_slice(&bytes).map_err(|e| {
            CoreError::Persistence(format!("invalid snapshot {}: {e}", self.path.display()))
        })?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| CoreError::Internal(format!("snapshot write task failed: {e}")))?
            .map_err(|e| {
                CoreError::Persistence(format!("failed to write {}: {e}", self.path.display()))
            })
    }
}

/// Write to a temp file next to `path`, then rename over it, so a crash
/// mid-write never leaves a truncated snapshot behind.
fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ── In-memory backend ───────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryMedium {
    saved: Arc<Mutex<Option<Snapshot>>>,
    #[cfg(test)]
    fail_saves: Arc<std::sync::atomic::AtomicBool>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Option<Snapshot> {
        lock(&self.saved).clone()
    }

    #[cfg(test)]
    pub(crate) fn fail_saves(&self, fail: bool) {
        self.fail_saves
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

impl SnapshotBackend for MemoryMedium {
    async fn load(&self) -> Result<Option<Snapshot>, CoreError> {
        Ok(self.saved())
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        #[cfg(test)]
        if self.fail_saves.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(CoreError::Persistence("simulated save failure".into()));
        }
        *lock(&self.saved) = Some(snapshot.clone());
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
