//! # Campground Check
//!
//! This crate runs one availability-check pass over the configured
//! campgrounds: query the search collaborator, compare against the cached
//! snapshot, and notify subscribers when availability changed. Every
//! campground is processed independently; one failing resource never aborts
//! the others.

/// Recreation.gov availability client
mod availability_client;
pub use availability_client::*;

/// Campground configuration and check errors
mod check_types;
pub use check_types::*;

/// Notification subject and body rendering
mod email_content;
pub use email_content::*;

/// The run-to-completion check executor
mod executor;
pub use executor::*;

/// Typed search-result records and the searcher boundary
mod search_types;
pub use search_types::*;
