use std::path::Path;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Booking provider a campground is monitored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    /// recreation.gov (federal facilities)
    RecreationDotGov,
    /// ReserveCalifornia (state park facilities)
    ReserveCalifornia,
}

/// One monitored campground from the static configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampgroundConfig {
    /// Provider-side facility identifier
    pub id: String,
    /// Display name used in notifications and metrics
    pub name: String,
    /// Which booking provider to search
    pub provider: Provider,
    /// Processing priority; higher runs first
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Disabled campgrounds are skipped without a metric
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_priority() -> i32 {
    1
}

fn default_enabled() -> bool {
    true
}

/// Load the monitored-campground list from a JSON config file.
///
/// Read once per invocation and treated as immutable input.
pub fn load_campgrounds(path: &Path) -> Result<Vec<CampgroundConfig>, CheckError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        CheckError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let campgrounds: Vec<CampgroundConfig> = serde_json::from_str(&contents)
        .map_err(|e| CheckError::Config(format!("invalid campground config: {e}")))?;

    if campgrounds.is_empty() {
        return Err(CheckError::Config("campground config is empty".to_string()));
    }

    Ok(campgrounds)
}

/// Date range covered by one search pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    /// First date to search, inclusive
    pub start_date: NaiveDate,
    /// Last date to search, inclusive
    pub end_date: NaiveDate,
}

impl SearchWindow {
    /// A window starting today and spanning the given number of days.
    pub fn next_days(days: u32) -> Self {
        let start_date = Utc::now().date_naive();
        Self {
            start_date,
            end_date: start_date + Duration::days(i64::from(days)),
        }
    }

    /// Whether a date falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Custom error type for availability-check operations
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream search API error
    #[error("API error: {0}")]
    ApiError(String),

    /// Rate limited by external API
    #[error("Rate limited by external API")]
    RateLimited,

    /// Authentication failed with external service
    #[error("Authentication failed with external service")]
    AuthenticationFailed,

    /// Facility not known to the provider
    #[error("Campground not found")]
    CampgroundNotFound,

    /// Data format error
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),
}
