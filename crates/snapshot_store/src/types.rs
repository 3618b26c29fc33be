use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted record of the most recent search results for one campground.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSnapshot {
    /// Campground the results belong to
    pub campground_id: String,
    /// When the snapshot was captured
    pub timestamp: DateTime<Utc>,
    /// The original, non-normalized search results
    pub results: Value,
    /// Content hash of the normalized results at capture time
    pub result_hash: String,
}

impl StoredSnapshot {
    /// Build a snapshot captured now.
    pub fn new(campground_id: impl Into<String>, results: Value, result_hash: String) -> Self {
        Self {
            campground_id: campground_id.into(),
            timestamp: Utc::now(),
            results,
            result_hash,
        }
    }
}

/// Cache of the previous search results per campground.
///
/// Both operations degrade gracefully: `retrieve` answers `None` for
/// missing, unreadable or corrupt entries, and `store` reports success as
/// a boolean so callers can continue with their in-memory comparison when
/// persistence fails.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Fetch the previous snapshot for a campground, if one exists.
    async fn retrieve(&self, campground_id: &str) -> Option<StoredSnapshot>;

    /// Persist a snapshot, overwriting any previous one. Returns whether
    /// the write succeeded.
    async fn store(&self, snapshot: &StoredSnapshot) -> bool;
}

/// Object key under which a campground's latest results are cached.
pub(crate) fn snapshot_key(campground_id: &str) -> String {
    format!("search-results/{campground_id}/latest.json")
}
