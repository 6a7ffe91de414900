//! Core library for the `stormwatch` dashboard client.
//!
//! This crate defines:
//! - Pure location resolution (nearest known location by great-circle distance)
//! - Pure forecast normalization (row zipping, unit conversion, code lookups)
//! - Storm-track decoding and landfall checks
//! - Clients for the dashboard backend and reverse geocoding
//! - Orchestration tying those together, and on-disk configuration
//!
//! It is used by `stormwatch-cli`, but can also be reused by other binaries or services.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod geocode;
pub mod model;
pub mod normalize;
pub mod resolver;
pub mod storm;
pub mod weather_code;

pub use api::{DashboardApi, HttpDashboardApi};
pub use config::{Config, LocationPrecedence};
pub use dashboard::{Dashboard, LocationQuery, ResolvedBy, ResolvedLocation};
pub use error::{ApiError, CoreError, DashboardError};
pub use geocode::{NoGeocoder, NominatimGeocoder, ReverseGeocoder};
pub use model::{Coordinate, ForecastPayload, Location};
pub use normalize::{
    AqiComponents, DailyRow, ForecastNormalizer, ForecastView, HourlyRow, Kilometers, Pollutant,
    StandardNormalizer, aqi_components, meters_to_kilometers, zip_daily, zip_hourly,
};
pub use resolver::{HaversineResolver, LocationResolver, find_nearest};
pub use storm::{StormOutlook, StormTrack};
pub use weather_code::{WeatherCodeEntry, describe_weather_code};
