//! Orchestration: which location, then which forecast, shaped for display.
//!
//! The resolver and normalizer are injected, as are the network-facing
//! backend and geocoder, so the whole chain runs without a network in tests.

use crate::{
    api::DashboardApi,
    config::LocationPrecedence,
    error::DashboardError,
    geocode::ReverseGeocoder,
    model::{Coordinate, Location},
    normalize::{ForecastNormalizer, ForecastView},
    resolver::LocationResolver,
    storm::StormOutlook,
};

/// Where the user wants the forecast for.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    /// A location name as the backend knows it.
    Named(String),
    /// A device position, resolved through the geocoder and resolver.
    Position(Coordinate),
    /// No hint at all: use the configured default.
    Default,
}

/// How a location name was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    Explicit,
    Geocoder,
    Nearest,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub name: String,
    pub resolved_by: ResolvedBy,
}

#[derive(Debug)]
pub struct Dashboard<A, G, R, N> {
    api: A,
    geocoder: G,
    resolver: R,
    normalizer: N,
    precedence: LocationPrecedence,
    default_location: String,
}

impl<A, G, R, N> Dashboard<A, G, R, N>
where
    A: DashboardApi,
    G: ReverseGeocoder,
    R: LocationResolver,
    N: ForecastNormalizer,
{
    pub fn new(api: A, geocoder: G, resolver: R, normalizer: N) -> Self {
        Self {
            api,
            geocoder,
            resolver,
            normalizer,
            precedence: LocationPrecedence::default(),
            default_location: crate::config::DEFAULT_LOCATION.to_string(),
        }
    }

    pub fn with_precedence(mut self, precedence: LocationPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_default_location(mut self, name: impl Into<String>) -> Self {
        self.default_location = name.into();
        self
    }

    pub async fn locations(&self) -> Result<Vec<Location>, DashboardError> {
        Ok(self.api.locations().await?)
    }

    /// Nearest known location to `target`, ignoring the geocoder.
    pub async fn nearest(&self, target: Coordinate) -> Result<Location, DashboardError> {
        let locations = self.api.locations().await?;
        Ok(self.resolver.find_nearest(&locations, target)?.clone())
    }

    pub async fn resolve(&self, query: &LocationQuery) -> Result<ResolvedLocation, DashboardError> {
        match query {
            LocationQuery::Named(name) => {
                Ok(ResolvedLocation { name: name.clone(), resolved_by: ResolvedBy::Explicit })
            }
            LocationQuery::Default => {
                tracing::warn!("No location given, using default: {}", self.default_location);
                Ok(ResolvedLocation {
                    name: self.default_location.clone(),
                    resolved_by: ResolvedBy::Default,
                })
            }
            LocationQuery::Position(at) => self.resolve_position(*at).await,
        }
    }

    async fn resolve_position(&self, at: Coordinate) -> Result<ResolvedLocation, DashboardError> {
        let locations = self.api.locations().await?;

        let label = match self.precedence {
            LocationPrecedence::Nearest => None,
            LocationPrecedence::Geocoder | LocationPrecedence::GeocoderIfKnown => {
                self.geocoder.region_name(at).await
            }
        };

        if let Some(label) = label {
            match self.precedence {
                LocationPrecedence::Geocoder => {
                    return Ok(ResolvedLocation { name: label, resolved_by: ResolvedBy::Geocoder });
                }
                LocationPrecedence::GeocoderIfKnown => {
                    if let Some(known) = find_by_name(&locations, &label) {
                        return Ok(ResolvedLocation {
                            name: known.name.clone(),
                            resolved_by: ResolvedBy::Geocoder,
                        });
                    }
                    tracing::info!("Geocoder label '{label}' is not a known location, using nearest");
                }
                LocationPrecedence::Nearest => {}
            }
        }

        let nearest = self.resolver.find_nearest(&locations, at)?;
        Ok(ResolvedLocation { name: nearest.name.clone(), resolved_by: ResolvedBy::Nearest })
    }

    /// Resolve `query`, fetch its forecast, and shape it for display.
    pub async fn forecast(&self, query: &LocationQuery) -> Result<ForecastView, DashboardError> {
        let resolved = self.resolve(query).await?;
        tracing::info!("Fetching forecast for {} ({:?})", resolved.name, resolved.resolved_by);

        let payload = self.api.forecast(&resolved.name).await?;
        Ok(self.normalizer.normalize(&resolved.name, &payload)?)
    }

    pub async fn storm_outlook(&self) -> Result<StormOutlook, DashboardError> {
        let response = self.api.storm_track().await?;

        let locations = if response.needs_locations() {
            self.api.locations().await?
        } else {
            Vec::new()
        };

        response.into_outlook(&locations)
    }
}

/// Case-insensitive name match. Nominatim and the backend sometimes
/// disagree on a "Thành phố"/"Tỉnh" prefix, so that is ignored too.
fn find_by_name<'a>(locations: &'a [Location], name: &str) -> Option<&'a Location> {
    let wanted = strip_admin_prefix(name).to_lowercase();
    locations.iter().find(|loc| strip_admin_prefix(&loc.name).to_lowercase() == wanted)
}

fn strip_admin_prefix(name: &str) -> &str {
    const PREFIXES: [&str; 2] = ["Thành phố ", "Tỉnh "];
    let trimmed = name.trim();
    PREFIXES
        .iter()
        .find_map(|p| trimmed.strip_prefix(p))
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{ApiError, CoreError},
        geocode::NoGeocoder,
        model::ForecastPayload,
        normalize::StandardNormalizer,
        resolver::HaversineResolver,
        storm::StormTrackResponse,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeApi {
        locations: Vec<Location>,
        storm: Option<serde_json::Value>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn vietnam() -> Self {
            Self {
                locations: vec![
                    Location::new("Hà Nội", 21.0285, 105.8542),
                    Location::new("Hồ Chí Minh", 10.8231, 106.6297),
                    Location::new("Đà Nẵng", 16.0544, 108.2022),
                ],
                ..Default::default()
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl DashboardApi for FakeApi {
        async fn locations(&self) -> Result<Vec<Location>, ApiError> {
            Ok(self.locations.clone())
        }

        async fn forecast(&self, location: &str) -> Result<ForecastPayload, ApiError> {
            self.requested.lock().expect("lock").push(location.to_string());
            serde_json::from_value(json!({
                "hourly": {
                    "time": ["2024-05-01T13:00", "2024-05-01T14:00"],
                    "weather_code": [0, 3],
                    "temperature_2m": [31.0, 30.2],
                    "precipitation": [0.0, 0.1]
                },
                "aqi": { "components": { "co": 1.2 } }
            }))
            .map_err(|source| ApiError::Decode { url: "fake".into(), source })
        }

        async fn storm_track(&self) -> Result<StormTrackResponse, ApiError> {
            let value = self.storm.clone().unwrap_or_else(|| json!({ "no_storm": true }));
            serde_json::from_value(value).map_err(|source| ApiError::Decode { url: "fake".into(), source })
        }
    }

    #[derive(Debug)]
    struct FixedGeocoder(&'static str);

    #[async_trait]
    impl ReverseGeocoder for FixedGeocoder {
        async fn region_name(&self, _at: Coordinate) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn dashboard<G: ReverseGeocoder>(
        api: FakeApi,
        geocoder: G,
    ) -> Dashboard<FakeApi, G, HaversineResolver, StandardNormalizer> {
        Dashboard::new(api, geocoder, HaversineResolver, StandardNormalizer)
    }

    const SAIGON: Coordinate = Coordinate { lat: 10.7769, lon: 106.7009 };

    #[tokio::test]
    async fn named_query_is_used_verbatim() {
        let dash = dashboard(FakeApi::vietnam(), NoGeocoder);
        let resolved = dash.resolve(&LocationQuery::Named("Huế".into())).await.expect("resolves");
        assert_eq!(resolved, ResolvedLocation { name: "Huế".into(), resolved_by: ResolvedBy::Explicit });
    }

    #[tokio::test]
    async fn default_query_uses_configured_default() {
        let dash = dashboard(FakeApi::vietnam(), NoGeocoder).with_default_location("Đà Nẵng");
        let resolved = dash.resolve(&LocationQuery::Default).await.expect("resolves");
        assert_eq!(resolved.name, "Đà Nẵng");
        assert_eq!(resolved.resolved_by, ResolvedBy::Default);
    }

    #[tokio::test]
    async fn position_without_geocoder_answer_uses_nearest() {
        let dash = dashboard(FakeApi::vietnam(), NoGeocoder);
        let resolved = dash.resolve(&LocationQuery::Position(SAIGON)).await.expect("resolves");
        assert_eq!(resolved.name, "Hồ Chí Minh");
        assert_eq!(resolved.resolved_by, ResolvedBy::Nearest);
    }

    #[tokio::test]
    async fn known_geocoder_label_wins_with_known_spelling() {
        let dash = dashboard(FakeApi::vietnam(), FixedGeocoder("Thành phố Hồ Chí Minh"));
        let resolved = dash.resolve(&LocationQuery::Position(SAIGON)).await.expect("resolves");
        assert_eq!(resolved.name, "Hồ Chí Minh");
        assert_eq!(resolved.resolved_by, ResolvedBy::Geocoder);
    }

    #[tokio::test]
    async fn unknown_geocoder_label_falls_back_to_nearest() {
        let dash = dashboard(FakeApi::vietnam(), FixedGeocoder("Ho Chi Minh City"));
        let resolved = dash.resolve(&LocationQuery::Position(SAIGON)).await.expect("resolves");
        assert_eq!(resolved.name, "Hồ Chí Minh");
        assert_eq!(resolved.resolved_by, ResolvedBy::Nearest);
    }

    #[tokio::test]
    async fn geocoder_precedence_trusts_any_label() {
        let dash = dashboard(FakeApi::vietnam(), FixedGeocoder("Ho Chi Minh City"))
            .with_precedence(LocationPrecedence::Geocoder);
        let resolved = dash.resolve(&LocationQuery::Position(SAIGON)).await.expect("resolves");
        assert_eq!(resolved.name, "Ho Chi Minh City");
        assert_eq!(resolved.resolved_by, ResolvedBy::Geocoder);
    }

    #[tokio::test]
    async fn nearest_precedence_ignores_geocoder() {
        let dash = dashboard(FakeApi::vietnam(), FixedGeocoder("Hà Nội"))
            .with_precedence(LocationPrecedence::Nearest);
        let resolved = dash.resolve(&LocationQuery::Position(SAIGON)).await.expect("resolves");
        assert_eq!(resolved.name, "Hồ Chí Minh");
    }

    #[tokio::test]
    async fn position_with_no_locations_is_invalid_input() {
        let dash = dashboard(FakeApi::default(), NoGeocoder);
        let err = dash.resolve(&LocationQuery::Position(SAIGON)).await.unwrap_err();
        assert!(matches!(err, DashboardError::Core(CoreError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn forecast_fetches_resolved_location_and_normalizes() {
        let dash = dashboard(FakeApi::vietnam(), NoGeocoder);
        let view = dash.forecast(&LocationQuery::Position(SAIGON)).await.expect("forecast");

        assert_eq!(view.location, "Hồ Chí Minh");
        assert_eq!(view.hourly.len(), 2);
        assert_eq!(view.hourly[1].hour, 14);
        assert_eq!(view.aqi.components.total(), 1.2);
        assert_eq!(dash.api.requested(), vec!["Hồ Chí Minh".to_string()]);
    }

    #[tokio::test]
    async fn nearest_returns_owned_location() {
        let dash = dashboard(FakeApi::vietnam(), NoGeocoder);
        let loc = dash.nearest(Coordinate::new(16.0, 108.0)).await.expect("nearest");
        assert_eq!(loc.name, "Đà Nẵng");
    }

    #[tokio::test]
    async fn storm_outlook_checks_landfall_against_locations() {
        let api = FakeApi {
            storm: Some(json!({
                "center": [16.0, 110.0],
                "track": { "type": "LineString", "coordinates": [[110.0, 16.0], [108.3, 16.1]] },
                "warning": "Cấp 12"
            })),
            ..FakeApi::vietnam()
        };
        let dash = dashboard(api, NoGeocoder);

        let StormOutlook::Storm(storm) = dash.storm_outlook().await.expect("outlook") else {
            panic!("expected a storm");
        };
        assert!(storm.landfall_expected);
        assert_eq!(storm.warning.as_deref(), Some("Cấp 12"));
    }

    #[tokio::test]
    async fn storm_outlook_reports_calm_weather() {
        let dash = dashboard(FakeApi::vietnam(), NoGeocoder);
        let outlook = dash.storm_outlook().await.expect("outlook");
        assert!(matches!(outlook, StormOutlook::NoStorm { .. }));
    }

    #[test]
    fn name_match_ignores_case_and_admin_prefix() {
        let locations = FakeApi::vietnam().locations;
        assert_eq!(find_by_name(&locations, "hà nội").map(|l| l.name.as_str()), Some("Hà Nội"));
        assert_eq!(find_by_name(&locations, "Thành phố Đà Nẵng").map(|l| l.name.as_str()), Some("Đà Nẵng"));
        assert!(find_by_name(&locations, "Huế").is_none());
    }
}
