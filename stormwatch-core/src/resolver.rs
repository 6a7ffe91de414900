use std::f64::consts::PI;

use crate::{
    error::CoreError,
    model::{Coordinate, Location},
};

/// Earth diameter in km (2 × 6371).
const EARTH_DIAMETER_KM: f64 = 12742.0;

/// Picks the best known location for a coordinate.
pub trait LocationResolver: Send + Sync {
    fn find_nearest<'a>(
        &self,
        locations: &'a [Location],
        target: Coordinate,
    ) -> Result<&'a Location, CoreError>;
}

/// Great-circle nearest lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineResolver;

impl LocationResolver for HaversineResolver {
    fn find_nearest<'a>(
        &self,
        locations: &'a [Location],
        target: Coordinate,
    ) -> Result<&'a Location, CoreError> {
        find_nearest(locations, target)
    }
}

/// Haversine distance between `from` and `to`, in km.
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = (to.lat - from.lat) * PI / 180.0;
    let d_lon = (to.lon - from.lon) * PI / 180.0;
    let a = 0.5 - d_lat.cos() / 2.0
        + (from.lat * PI / 180.0).cos() * (to.lat * PI / 180.0).cos() * (1.0 - d_lon.cos()) / 2.0;

    // Rounding can push `a` a hair past 1 for antipodal points.
    let a = if a > 1.0 { 1.0 } else { a };
    EARTH_DIAMETER_KM * a.sqrt().asin()
}

/// Nearest location to `target`. On equal distances the earlier entry wins.
pub fn find_nearest(locations: &[Location], target: Coordinate) -> Result<&Location, CoreError> {
    let first = locations
        .first()
        .ok_or_else(|| CoreError::InvalidInput("location list is empty".to_string()))?;

    let mut nearest = first;
    let mut min_distance = f64::INFINITY;

    for loc in locations {
        let distance = distance_km(target, loc.coordinate());
        if distance < min_distance {
            min_distance = distance;
            nearest = loc;
        }
    }

    tracing::debug!(
        "Nearest location to ({}, {}) is {} ({:.1} km)",
        target.lat,
        target.lon,
        nearest.name,
        min_distance
    );

    Ok(nearest)
}
