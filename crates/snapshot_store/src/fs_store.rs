use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::types::{SnapshotStore, StoredSnapshot, snapshot_key};

/// Snapshot store backed by a writable cache directory, for local runs.
///
/// The directory is injected explicitly at construction; the store never
/// consults environment variables or mutates process-wide state.
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    cache_dir: PathBuf,
}

impl FsSnapshotStore {
    /// Create a store rooted at the given cache directory.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self { cache_dir: cache_dir.into() }
    }

    /// The cache directory this store writes under.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn snapshot_path(&self, campground_id: &str) -> PathBuf {
        self.cache_dir.join(snapshot_key(campground_id))
    }
}

#[async_trait]
impl SnapshotStore for FsSnapshotStore {
    async fn retrieve(&self, campground_id: &str) -> Option<StoredSnapshot> {
        let path = self.snapshot_path(campground_id);

        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No previous results found for campground {}", campground_id);
                return None;
            }
            Err(e) => {
                error!(
                    "Failed to read cached results for campground {}: {}",
                    campground_id, e
                );
                return None;
            }
        };

        match serde_json::from_slice::<StoredSnapshot>(&contents) {
            Ok(snapshot) => {
                debug!("Loaded cached results for campground {}", campground_id);
                Some(snapshot)
            }
            Err(e) => {
                error!(
                    "Data parsing error for campground {}: {}",
                    campground_id, e
                );
                None
            }
        }
    }

    async fn store(&self, snapshot: &StoredSnapshot) -> bool {
        let path = self.snapshot_path(&snapshot.campground_id);

        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                error!("Failed to create cache directory {}: {}", parent.display(), e);
                return false;
            }
        }

        let body = match serde_json::to_vec_pretty(snapshot) {
            Ok(body) => body,
            Err(e) => {
                error!(
                    "JSON serialization error for campground {}: {}",
                    snapshot.campground_id, e
                );
                return false;
            }
        };

        match tokio::fs::write(&path, body).await {
            Ok(()) => {
                debug!(
                    "Stored results for campground {} at {}",
                    snapshot.campground_id,
                    path.display()
                );
                true
            }
            Err(e) => {
                error!(
                    "Failed to write cached results for campground {}: {}",
                    snapshot.campground_id, e
                );
                false
            }
        }
    }
}
