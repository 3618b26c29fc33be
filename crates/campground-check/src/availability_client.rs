use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::check_types::{CampgroundConfig, CheckError, Provider, SearchWindow};
use crate::search_types::{AvailabilitySearcher, AvailableSite, SearchResults};

/// Client for the recreation.gov availability API.
pub struct RecApiClient {
    client: Client,
    ridb_base_url: String,
    booking_base_url: String,
    api_key: Option<String>,
}

/// Response structure from the recreation.gov campsite availability API
#[derive(Debug, Deserialize)]
struct RecApiAvailabilityResponse {
    #[serde(rename = "RECDATA")]
    rec_data: Vec<RecApiCampsite>,
}

/// Individual campsite data from recreation.gov
#[derive(Debug, Deserialize)]
struct RecApiCampsite {
    #[serde(rename = "CampsiteID")]
    campsite_id: String,

    #[serde(rename = "CampsiteName")]
    campsite_name: Option<String>,

    #[serde(rename = "CampsiteType")]
    campsite_type: Option<String>,

    #[serde(rename = "Loop")]
    campsite_loop: Option<String>,

    #[serde(rename = "PERMITTEDEQUIPMENT", default)]
    permitted_equipment: Option<Vec<RecApiEquipment>>,

    #[serde(rename = "Availabilities")]
    availabilities: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct RecApiEquipment {
    #[serde(rename = "EquipmentName")]
    equipment_name: String,
}

impl RecApiClient {
    /// Create a new recreation.gov API client
    pub fn new(api_key: Option<String>) -> Result<Self, CheckError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| CheckError::ApiError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            ridb_base_url: "https://ridb.recreation.gov/api/v1".to_string(),
            booking_base_url: "https://www.recreation.gov/camping/campsites".to_string(),
            api_key,
        })
    }

    /// Get available site-nights for a facility within a date range.
    async fn get_campground_availability(
        &self,
        campground: &CampgroundConfig,
        window: &SearchWindow,
    ) -> Result<Vec<AvailableSite>, CheckError> {
        debug!(
            "Fetching availability for facility {} from {} to {}",
            campground.id, window.start_date, window.end_date
        );

        let url = format!("{}/facilities/{}/campsites", self.ridb_base_url, campground.id);

        let mut params = vec![("limit", "1000".to_string()), ("offset", "0".to_string())];
        if let Some(ref api_key) = self.api_key {
            params.push(("apikey", api_key.clone()));
        }

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| CheckError::Network(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(match status.as_u16() {
                429 => CheckError::RateLimited,
                401 | 403 => CheckError::AuthenticationFailed,
                404 => CheckError::CampgroundNotFound,
                _ => CheckError::ApiError(format!("HTTP {status}")),
            });
        }

        let rec_response: RecApiAvailabilityResponse = response
            .json()
            .await
            .map_err(|e| CheckError::DataFormat(format!("Failed to parse response: {e}")))?;

        let mut available_sites = Vec::new();
        for campsite in &rec_response.rec_data {
            if let Some(ref availabilities) = campsite.availabilities {
                available_sites.extend(parse_availability_data(
                    campground,
                    self.booking_base_url.as_str(),
                    campsite,
                    availabilities,
                    window,
                ));
            }
        }

        Ok(available_sites)
    }
}

#[async_trait]
impl AvailabilitySearcher for RecApiClient {
    async fn search(
        &self,
        campground: &CampgroundConfig,
        window: &SearchWindow,
    ) -> Result<SearchResults, CheckError> {
        // TODO: ReserveCalifornia searcher (UseDirect API) behind the same trait.
        if campground.provider != Provider::RecreationDotGov {
            return Err(CheckError::Config(format!(
                "provider {:?} is not supported by the recreation.gov searcher",
                campground.provider
            )));
        }

        let sites = self.get_campground_availability(campground, window).await?;
        Ok(SearchResults::new(campground, sites))
    }
}

/// Convert one campsite's availability map into available site-night records.
fn parse_availability_data(
    campground: &CampgroundConfig,
    booking_base_url: &str,
    campsite: &RecApiCampsite,
    availabilities: &HashMap<String, String>,
    window: &SearchWindow,
) -> Vec<AvailableSite> {
    let mut sites = Vec::new();

    for (date_str, status) in availabilities {
        // Dates arrive as "2025-01-15T00:00:00Z"
        let Some(date) = parse_availability_date(date_str) else {
            warn!("Failed to parse date: {}", date_str);
            continue;
        };

        if !window.contains(date) {
            continue;
        }

        if !is_available_status(status) {
            continue;
        }

        sites.push(AvailableSite {
            campsite_id: campsite.campsite_id.clone(),
            booking_date: date,
            campsite_site_name: campsite
                .campsite_name
                .clone()
                .unwrap_or_else(|| campsite.campsite_id.clone()),
            facility_name: campground.name.clone(),
            booking_url: format!("{}/{}", booking_base_url, campsite.campsite_id),
            campsite_type: campsite.campsite_type.clone(),
            recreation_area: campsite.campsite_loop.clone(),
            num_nights: 1,
            permitted_equipment: campsite.permitted_equipment.as_ref().map(|equipment| {
                equipment.iter().map(|e| e.equipment_name.clone()).collect()
            }),
        });
    }

    // HashMap iteration order is arbitrary; keep records deterministic.
    sites.sort_by(|a, b| (a.campsite_id.as_str(), a.booking_date).cmp(&(b.campsite_id.as_str(), b.booking_date)));
    sites
}

fn parse_availability_date(date_str: &str) -> Option<NaiveDate> {
    let prefix = date_str.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Whether a recreation.gov availability status marks a bookable site.
fn is_available_status(status: &str) -> bool {
    match status {
        "Available" => true,
        "Reserved" | "Not Available" | "Not Reservable" | "Walk-up" => false,
        // Legacy RIDB single-letter format
        "A" => true,
        "R" | "X" | "W" | "N" => false,
        // Price string means available
        s if s.starts_with('$') => true,
        _ => {
            debug!("Unknown availability status: {}", status);
            false
        }
    }
}
