use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::check_types::{CampgroundConfig, CheckError, SearchWindow};

/// One bookable site-night found by a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSite {
    /// Provider-side campsite identifier
    pub campsite_id: String,
    /// Date the site can be booked for
    pub booking_date: NaiveDate,
    /// Human-readable site name
    pub campsite_site_name: String,
    /// Facility (campground area) the site belongs to
    pub facility_name: String,
    /// Direct booking link for the site
    pub booking_url: String,
    /// Site category tag, e.g. "STANDARD" or "CABIN"
    pub campsite_type: Option<String>,
    /// Recreation area the facility belongs to, when known
    pub recreation_area: Option<String>,
    /// Number of consecutive available nights starting at `booking_date`
    pub num_nights: u32,
    /// Equipment permitted on the site, when the provider reports it
    pub permitted_equipment: Option<Vec<String>>,
}

/// One snapshot of availability for one monitored campground.
///
/// Never mutated after creation; comparison always operates on a
/// normalized copy of [`SearchResults::to_snapshot_value`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Campground the search ran against
    pub campground_id: String,
    /// Display name of the campground
    pub campground_name: String,
    /// Sites found available within the search window
    pub available_sites: Vec<AvailableSite>,
    /// Total available site-nights across all sites
    pub total_available_nights: u32,
    /// When the search ran. Volatile: excluded from comparison.
    pub search_timestamp: DateTime<Utc>,
}

impl SearchResults {
    /// Build results captured now from a list of available sites.
    pub fn new(campground: &CampgroundConfig, available_sites: Vec<AvailableSite>) -> Self {
        let total_available_nights = available_sites.iter().map(|s| s.num_nights).sum();
        Self {
            campground_id: campground.id.clone(),
            campground_name: campground.name.clone(),
            available_sites,
            total_available_nights,
            search_timestamp: Utc::now(),
        }
    }

    /// The JSON mapping handed to the comparator and the snapshot store.
    ///
    /// Falls back to `null` when serialization fails, which the comparator
    /// resolves as "changed" rather than dropping a notification.
    pub fn to_snapshot_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            warn!("Failed to serialize search results for {}: {}", self.campground_id, e);
            Value::Null
        })
    }
}

/// Search collaborator boundary: availability for one campground over a
/// date range. Raises on transient upstream failure; the executor recovers
/// per resource.
#[async_trait]
pub trait AvailabilitySearcher: Send + Sync {
    /// Search one campground for available sites within the window.
    async fn search(
        &self,
        campground: &CampgroundConfig,
        window: &SearchWindow,
    ) -> Result<SearchResults, CheckError>;
}
