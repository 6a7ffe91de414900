//! Storm-track responses and the landfall check.
//!
//! The backend answers `/api/storm_track` in one of four shapes: a
//! no-storm notice, a detected track (`center` as `[lat, lon]`, track as a
//! GeoJSON LineString of `[lon, lat]`), a mock GeoJSON FeatureCollection,
//! or an `{ "error": ... }` object.

use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, CoreError, DashboardError},
    model::{Coordinate, Location},
};

/// Degrees, in both latitude and longitude, within which a track point
/// counts as reaching a known location.
pub const LANDFALL_THRESHOLD_DEG: f64 = 0.5;

const DEFAULT_NO_STORM_MESSAGE: &str = "No storm detected";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StormTrackResponse {
    Detected {
        center: [f64; 2],
        track: LineString,
        #[serde(default)]
        landfall_vn: Option<bool>,
        #[serde(default)]
        warning: Option<String>,
    },
    FeatureCollection {
        features: Vec<Feature>,
    },
    NoStorm {
        no_storm: bool,
        #[serde(default)]
        message: Option<String>,
    },
    Error {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LineString {
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    LineString { coordinates: Vec<[f64; 2]> },
    Point { coordinates: [f64; 2] },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StormTrack {
    pub track: Vec<Coordinate>,
    pub center: Coordinate,
    pub warning: Option<String>,
    pub landfall_expected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StormOutlook {
    NoStorm { message: String },
    Storm(StormTrack),
}

fn from_lon_lat([lon, lat]: [f64; 2]) -> Coordinate {
    Coordinate::new(lat, lon)
}

impl StormTrackResponse {
    /// Whether turning this response into an outlook needs the location
    /// list (the backend did not say whether the storm makes landfall).
    pub fn needs_locations(&self) -> bool {
        match self {
            StormTrackResponse::Detected { landfall_vn, .. } => landfall_vn.is_none(),
            StormTrackResponse::FeatureCollection { .. } => true,
            StormTrackResponse::NoStorm { .. } | StormTrackResponse::Error { .. } => false,
        }
    }

    /// Convert to the domain outlook. `locations` feeds the landfall check
    /// when the response lacks a landfall flag.
    pub fn into_outlook(self, locations: &[Location]) -> Result<StormOutlook, DashboardError> {
        match self {
            StormTrackResponse::Detected { center, track, landfall_vn, warning } => {
                let track: Vec<Coordinate> = track.coordinates.into_iter().map(from_lon_lat).collect();
                let landfall_expected =
                    landfall_vn.unwrap_or_else(|| landfall_expected(&track, locations));
                Ok(StormOutlook::Storm(StormTrack {
                    track,
                    center: Coordinate::new(center[0], center[1]),
                    warning,
                    landfall_expected,
                }))
            }
            StormTrackResponse::FeatureCollection { features } => {
                let mut track = Vec::new();
                let mut center = None;
                for feature in features {
                    match feature.geometry {
                        Geometry::LineString { coordinates } if track.is_empty() => {
                            track = coordinates.into_iter().map(from_lon_lat).collect();
                        }
                        Geometry::Point { coordinates } if center.is_none() => {
                            center = Some(from_lon_lat(coordinates));
                        }
                        _ => {}
                    }
                }

                let center = center
                    .or_else(|| track.last().copied())
                    .ok_or_else(|| CoreError::malformed("storm_track", "no track or center feature"))?;
                let landfall_expected = landfall_expected(&track, locations);
                Ok(StormOutlook::Storm(StormTrack { track, center, warning: None, landfall_expected }))
            }
            StormTrackResponse::NoStorm { message, .. } => Ok(StormOutlook::NoStorm {
                message: message.unwrap_or_else(|| DEFAULT_NO_STORM_MESSAGE.to_string()),
            }),
            StormTrackResponse::Error { error } => Err(ApiError::Backend(error).into()),
        }
    }
}

/// True if any projected point (every point after the first) lies within
/// [`LANDFALL_THRESHOLD_DEG`] of a known location.
pub fn landfall_expected(track: &[Coordinate], locations: &[Location]) -> bool {
    track.iter().skip(1).any(|point| {
        locations.iter().any(|loc| {
            (point.lat - loc.lat).abs() < LANDFALL_THRESHOLD_DEG
                && (point.lon - loc.lon).abs() < LANDFALL_THRESHOLD_DEG
        })
    })
}
