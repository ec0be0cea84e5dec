//! Reverse geocoding with a coordinate-string fallback.
//!
//! Any failure — unreachable endpoint, non-2xx, bad JSON, missing
//! field — degrades to `"{lat}, {lon}"` text. Callers never see a
//! geocoding error.

use std::time::Duration;

use serde::Deserialize;

use crate::config;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ReverseGeocodeBody {
    display_name: Option<String>,
}

/// Client for a Nominatim-compatible reverse geocoding endpoint.
pub struct Geocoder {
    client: reqwest::Client,
    endpoint: String,
}

impl Geocoder {
    pub fn new(endpoint: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("{}/{}", config::APP_NAME, config::APP_VERSION))
            .build()
            .unwrap_or_default();
        Self { client, endpoint }
    }

    /// Endpoint from config (env-overridable).
    pub fn from_config() -> Self {
        Self::new(config::geocode_endpoint())
    }

    /// Resolve coordinates to an address string, falling back to the
    /// coordinate text on any failure.
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> String {
        match self.lookup(latitude, longitude).await {
            Ok(Some(address)) => address,
            Ok(None) => {
                tracing::debug!(latitude, longitude, "geocode response had no display_name");
                coordinate_fallback(latitude, longitude)
            }
            Err(e) => {
                tracing::warn!(latitude, longitude, error = %e, "reverse geocode failed");
                coordinate_fallback(latitude, longitude)
            }
        }
    }

    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<Option<String>, reqwest::Error> {
        let body: ReverseGeocodeBody = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "jsonv2".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.display_name.filter(|s| !s.is_empty()))
    }
}

/// The text shown when no address is available.
pub fn coordinate_fallback(latitude: f64, longitude: f64) -> String {
    format!("{latitude:.5}, {longitude:.5}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_formats_five_decimals() {
        assert_eq!(coordinate_fallback(6.5244, 3.3792), "6.52440, 3.37920");
        assert_eq!(coordinate_fallback(-33.86785, 151.20732), "-33.86785, 151.20732");
    }

    #[tokio::test]
    async fn unreachable_endpoint_falls_back_to_coordinates() {
        // Port 9 (discard) refuses connections immediately
        let geocoder = Geocoder::new("http://127.0.0.1:9/reverse".to_string());
        let text = geocoder.reverse(6.5244, 3.3792).await;
        assert_eq!(text, "6.52440, 3.37920");
    }

    #[tokio::test]
    async fn malformed_endpoint_falls_back_to_coordinates() {
        let geocoder = Geocoder::new("not a url".to_string());
        let text = geocoder.reverse(1.0, 2.0).await;
        assert_eq!(text, "1.00000, 2.00000");
    }
}
