//! # Snapshot Compare
//!
//! This crate decides whether two campground search-result snapshots are
//! materially different. Snapshots are normalized into a canonical form that
//! is immune to key ordering, string case/whitespace and volatile timestamp
//! fields, then compared by SHA-256 content hash.

/// Normalization, hashing and change detection for result snapshots
mod comparator;
pub use comparator::*;
