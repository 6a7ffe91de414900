//! WMO weather interpretation codes as emitted by Open-Meteo.
//! See: https://open-meteo.com/en/docs#weathervariables

use serde::Serialize;

/// Display description and icon key for a weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeatherCodeEntry {
    pub code: i32,
    pub description: &'static str,
    pub icon_key: &'static str,
}

pub const UNKNOWN_DESCRIPTION: &str = "Unknown";
pub const UNKNOWN_ICON: &str = "cloud-question";

const fn entry(code: i32, description: &'static str, icon_key: &'static str) -> WeatherCodeEntry {
    WeatherCodeEntry { code, description, icon_key }
}

static TABLE: &[WeatherCodeEntry] = &[
    entry(0, "Clear sky", "sun"),
    entry(1, "Mainly clear", "cloud"),
    entry(2, "Partly cloudy", "cloud"),
    entry(3, "Overcast", "cloud"),
    entry(45, "Fog", "cloud-fog"),
    entry(48, "Depositing rime fog", "cloud-fog"),
    entry(51, "Light drizzle", "cloud-drizzle"),
    entry(53, "Moderate drizzle", "cloud-drizzle"),
    entry(55, "Dense drizzle", "cloud-drizzle"),
    entry(56, "Light freezing drizzle", "cloud-drizzle"),
    entry(57, "Dense freezing drizzle", "cloud-drizzle"),
    entry(61, "Slight rain", "cloud-rain"),
    entry(63, "Moderate rain", "cloud-rain"),
    entry(65, "Heavy rain", "cloud-rain-wind"),
    entry(66, "Light freezing rain", "cloud-hail"),
    entry(67, "Heavy freezing rain", "cloud-hail"),
    entry(71, "Slight snow fall", "cloud-snow"),
    entry(73, "Moderate snow fall", "cloud-snow"),
    entry(75, "Heavy snow fall", "cloud-snow"),
    entry(77, "Snow grains", "snowflake"),
    entry(80, "Slight rain showers", "cloud-rain"),
    entry(81, "Moderate rain showers", "cloud-rain"),
    entry(82, "Violent rain showers", "cloud-rain-wind"),
    entry(85, "Slight snow showers", "cloud-snow"),
    entry(86, "Heavy snow showers", "cloud-snow"),
    entry(95, "Thunderstorm", "cloud-lightning"),
    entry(96, "Thunderstorm with slight hail", "cloud-lightning"),
    entry(99, "Thunderstorm with heavy hail", "cloud-lightning"),
];

/// Look up `code`. Never fails: codes missing from the table get the
/// "Unknown" entry carrying the requested code.
pub fn describe_weather_code(code: i32) -> WeatherCodeEntry {
    TABLE
        .iter()
        .find(|e| e.code == code)
        .copied()
        .unwrap_or(WeatherCodeEntry { code, description: UNKNOWN_DESCRIPTION, icon_key: UNKNOWN_ICON })
}

/// Same as [`describe_weather_code`] for codes that may be absent (`null`).
pub fn describe_optional(code: Option<i32>) -> WeatherCodeEntry {
    match code {
        Some(c) => describe_weather_code(c),
        None => WeatherCodeEntry { code: -1, description: UNKNOWN_DESCRIPTION, icon_key: UNKNOWN_ICON },
    }
}
