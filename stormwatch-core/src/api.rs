use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::ApiError,
    model::{ForecastPayload, Location},
    storm::StormTrackResponse,
};

pub const PROVINCES_PATH: &str = "/api/provinces";
pub const FORECAST_PATH: &str = "/api/forecast";
pub const STORM_TRACK_PATH: &str = "/api/storm_track";

/// The dashboard backend, as seen by the client.
#[async_trait]
pub trait DashboardApi: Send + Sync + Debug {
    /// Known locations, in backend order.
    async fn locations(&self) -> Result<Vec<Location>, ApiError>;

    async fn forecast(&self, location: &str) -> Result<ForecastPayload, ApiError>;

    async fn storm_track(&self) -> Result<StormTrackResponse, ApiError>;
}

#[derive(Debug, Deserialize)]
struct BackendError {
    error: String,
}

#[derive(Debug, Clone)]
pub struct HttpDashboardApi {
    base_url: String,
    http: Client,
}

impl HttpDashboardApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build().map_err(ApiError::Client)?;

        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {url} {query:?}");

        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Request { url: url.clone(), source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ApiError::Request { url: url.clone(), source })?;

        if !status.is_success() {
            let message = serde_json::from_str::<BackendError>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| truncate_body(&body));
            return Err(ApiError::HttpStatus { url, status, message });
        }

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|source| ApiError::Decode { url: url.clone(), source })?;

        // The backend reports some failures as `{ "error": ... }` with a 200.
        if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
            return Err(ApiError::Backend(error.to_string()));
        }

        serde_json::from_value(value).map_err(|source| ApiError::Decode { url, source })
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn locations(&self) -> Result<Vec<Location>, ApiError> {
        let locations: Vec<Location> = self.get_json(PROVINCES_PATH, &[]).await?;
        tracing::info!("Loaded {} locations", locations.len());
        Ok(locations)
    }

    async fn forecast(&self, location: &str) -> Result<ForecastPayload, ApiError> {
        self.get_json(FORECAST_PATH, &[("province", location)]).await
    }

    async fn storm_track(&self) -> Result<StormTrackResponse, ApiError> {
        self.get_json(STORM_TRACK_PATH, &[]).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
