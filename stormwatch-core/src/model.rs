use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A point on the globe, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A named place known to the backend (a province). Identity is `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lon: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self { name: name.into(), lat, lon }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// Raw forecast as served by `/api/forecast`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub current: CurrentBlock,
    #[serde(default)]
    pub hourly: HourlyBlock,
    #[serde(default)]
    pub daily: DailyBlock,
    #[serde(default)]
    pub aqi: AqiBlock,
    #[serde(default)]
    pub ml_prediction: Option<MlPrediction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentBlock {
    pub time: Option<String>,
    pub temperature_2m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub pressure_msl: Option<f64>,
    /// Metres.
    pub visibility: Option<f64>,
    pub uv_index: Option<f64>,
}

/// Parallel, index-aligned hourly arrays.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlyBlock {
    #[serde(default, deserialize_with = "local_time::deserialize")]
    pub time: Vec<NaiveDateTime>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
}

/// Parallel, index-aligned daily arrays.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyBlock {
    #[serde(default)]
    pub time: Vec<NaiveDate>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_max: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub temperature_2m_min: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AqiBlock {
    #[serde(default)]
    pub index: Option<AqiValue>,
    #[serde(default)]
    pub components: HashMap<String, AqiValue>,
}

/// A pollutant reading: either a bare number or a WAQI `{ "v": n }` object.
/// Anything else (WAQI sends "-" for missing stations) carries no value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AqiValue {
    Number(f64),
    Reading { v: f64 },
    Other(serde_json::Value),
}

impl AqiValue {
    pub fn value(&self) -> Option<f64> {
        match *self {
            AqiValue::Number(v) | AqiValue::Reading { v } => Some(v),
            AqiValue::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MlPrediction {
    #[serde(default)]
    pub predicted_temperature: Vec<f64>,
}

/// Open-Meteo local timestamps ("2024-05-01T13:00"), tolerating seconds
/// and RFC 3339 offsets.
mod local_time {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| {
                parse(s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{s}'")))
            })
            .collect()
    }

    fn parse(s: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
    }
}
