use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::app::ports::GeocodeClient;
use crate::config::GeocodingConfig;
use crate::domain::GeocodeResult;
use crate::error::Result;

const GEOCODE_PATH: &str = "/maps/api/geocode/json";

/// Google Geocoding API response, reduced to what the pipeline reads
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<Candidate>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

#[derive(Error, Debug)]
enum LookupError {
    /// The service answered with an error status such as `REQUEST_DENIED`
    #[error("geocoding service returned {status}: {message}")]
    Api { status: String, message: String },

    #[error("geocoding service responded with HTTP {0}")]
    HttpStatus(u16),

    #[error("geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// [`GeocodeClient`] backed by the Google Geocoding HTTP API
pub struct GoogleGeocoder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(config: &GeocodingConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", config.base_url.trim_end_matches('/'), GEOCODE_PATH),
            api_key,
        })
    }

    /// Coordinates of the first candidate, or `None` when the service found nothing
    async fn request(&self, address: &str) -> std::result::Result<Option<(f64, f64)>, LookupError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LookupError::HttpStatus(status.as_u16()));
        }
        let body: GeocodeResponse = resp.json().await?;

        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(body
                .results
                .first()
                .map(|c| (c.geometry.location.lat, c.geometry.location.lng))),
            _ => Err(LookupError::Api {
                message: body.error_message.unwrap_or_default(),
                status: body.status,
            }),
        }
    }
}

#[async_trait]
impl GeocodeClient for GoogleGeocoder {
    async fn lookup(&self, address: &str) -> GeocodeResult {
        match self.request(address).await {
            Ok(Some((lat, lng))) => {
                debug!(%address, lat, lng, "Geocoded address");
                GeocodeResult::success(lat, lng)
            }
            Ok(None) => GeocodeResult::no_result(),
            Err(e @ LookupError::Api { .. }) => {
                warn!(%address, error = %e, "Geocoding API error");
                GeocodeResult::api_error()
            }
            Err(e) => {
                warn!(%address, error = %e, "Geocoding request failed");
                GeocodeResult::error()
            }
        }
    }
}
