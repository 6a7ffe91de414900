//! Reverse geocoding: coordinate to administrative region name.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{error::ApiError, model::Coordinate};

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const USER_AGENT: &str = concat!("stormwatch/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait ReverseGeocoder: Send + Sync + Debug {
    /// Region (province/state) name for `at`. `None` when the service has
    /// no answer or fails; callers fall back to the nearest known location.
    async fn region_name(&self, at: Coordinate) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    state: Option<String>,
    city: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    http: Client,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), http })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn region_name(&self, at: Coordinate) -> Option<String> {
        let url = format!("{}/reverse", self.base_url);
        let lat = at.lat.to_string();
        let lon = at.lon.to_string();

        let response = match self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("format", "json"),
                ("addressdetails", "1"),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let body: NominatimResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        // Centrally-governed cities (Hà Nội, Đà Nẵng, ...) come back without
        // a state, only a city.
        let address = body.address?;
        let region = address.state.or(address.city).filter(|s| !s.trim().is_empty())?;

        tracing::info!("Reverse geocoded ({}, {}) to: {}", at.lat, at.lon, region);
        Some(region)
    }
}

#[async_trait]
impl<T: ReverseGeocoder + ?Sized> ReverseGeocoder for Box<T> {
    async fn region_name(&self, at: Coordinate) -> Option<String> {
        (**self).region_name(at).await
    }
}

/// Geocoder that never answers; used when geocoding is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeocoder;

#[async_trait]
impl ReverseGeocoder for NoGeocoder {
    async fn region_name(&self, _at: Coordinate) -> Option<String> {
        None
    }
}
