//! # Snapshot Store
//!
//! Persistence boundary for the last-seen search results per campground.
//! The store is a simple get/put of a JSON envelope keyed by campground id;
//! not-found and storage failure are ordinary outcomes, never errors that
//! abort the check cycle.

/// Filesystem-backed store for local development runs.
mod fs_store;
/// S3-backed store used in deployment.
mod s3_store;
/// Stored snapshot envelope and the store trait.
mod types;

pub use fs_store::FsSnapshotStore;
pub use s3_store::S3SnapshotStore;
pub use types::{SnapshotStore, StoredSnapshot};
