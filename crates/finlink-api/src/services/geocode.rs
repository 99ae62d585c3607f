//! Address search against a Nominatim-style geocoding API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Queries shorter than this are rejected before any network call.
pub const MIN_QUERY_LEN: usize = 3;
const RESULT_LIMIT: u8 = 5;
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One search hit. Coordinates stay as strings, matching the upstream wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodePlace {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
}

#[derive(Clone)]
pub struct GeocodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeocodeClient {
    pub fn new(config: &ApiConfig) -> Self {
        // Nominatim's usage policy requires an identifying user agent.
        let http = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .user_agent(concat!("finlink-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: config.geocode_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Free-text address search, bounded to a handful of results.
    pub async fn search(&self, query: &str) -> ApiResult<Vec<GeocodePlace>> {
        let query = query.trim();
        if query.len() < MIN_QUERY_LEN {
            return Err(ApiError::Validation(format!(
                "query must be at least {MIN_QUERY_LEN} characters"
            )));
        }

        let url = format!("{}/search", self.base_url);
        let places: Vec<GeocodePlace> = self
            .http
            .get(&url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", &RESULT_LIMIT.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ApiError::Internal(format!("Geocoding request failed: {e}")))?
            .error_for_status()
            .map_err(|e| ApiError::Internal(format!("Geocoding request failed: {e}")))?
            .json()
            .await
            .map_err(|e| ApiError::Internal(format!("Invalid geocoding response: {e}")))?;

        debug!(query, count = places.len(), "Geocode search completed");
        Ok(places)
    }
}
