//! Shapes a raw [`ForecastPayload`] into display-ready values.
//!
//! Every function here is pure: no I/O, no mutation of the payload.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::{
    error::CoreError,
    model::{AqiBlock, AqiValue, CurrentBlock, DailyBlock, ForecastPayload, HourlyBlock},
    weather_code::{WeatherCodeEntry, describe_optional},
};

/// A distance in kilometres. Keeps the exact value; displays one decimal.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Kilometers(f64);

impl Kilometers {
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn rounded(self) -> f64 {
        (self.0 * 10.0).round() / 10.0
    }
}

impl fmt::Display for Kilometers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.rounded())
    }
}

pub fn meters_to_kilometers(meters: f64) -> Kilometers {
    Kilometers(meters / 1000.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlyRow {
    pub time: NaiveDateTime,
    /// Local hour of day, 0-23.
    pub hour: u32,
    pub weather_code: Option<i32>,
    pub temperature_c: Option<f64>,
    pub precipitation_mm: Option<f64>,
}

impl HourlyRow {
    pub fn weather(&self) -> WeatherCodeEntry {
        describe_optional(self.weather_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub weather_code: Option<i32>,
    pub precipitation_sum_mm: Option<f64>,
    pub wind_speed_max_kmh: Option<f64>,
    pub temperature_max_c: Option<f64>,
    pub temperature_min_c: Option<f64>,
}

impl DailyRow {
    pub fn weather(&self) -> WeatherCodeEntry {
        describe_optional(self.weather_code)
    }
}

fn ensure_aligned(section: &'static str, columns: &[(&str, usize)]) -> Result<(), CoreError> {
    let Some(&(first_name, expected)) = columns.first() else {
        return Ok(());
    };

    match columns.iter().find(|(_, len)| *len != expected) {
        Some((name, len)) => Err(CoreError::malformed(
            section,
            format!("'{name}' has {len} entries but '{first_name}' has {expected}"),
        )),
        None => Ok(()),
    }
}

/// Index-aligned hourly rows. Fails if the parallel arrays differ in length.
pub fn zip_hourly(
    block: &HourlyBlock,
) -> Result<impl Iterator<Item = HourlyRow> + '_, CoreError> {
    ensure_aligned(
        "hourly",
        &[
            ("time", block.time.len()),
            ("weather_code", block.weather_code.len()),
            ("temperature_2m", block.temperature_2m.len()),
            ("precipitation", block.precipitation.len()),
        ],
    )?;

    Ok(block
        .time
        .iter()
        .zip(&block.weather_code)
        .zip(&block.temperature_2m)
        .zip(&block.precipitation)
        .map(|(((time, code), temp), precip)| HourlyRow {
            time: *time,
            hour: time.hour(),
            weather_code: *code,
            temperature_c: *temp,
            precipitation_mm: *precip,
        }))
}

/// Index-aligned daily rows. Temperature extremes are optional columns but
/// must match the others when present.
pub fn zip_daily(block: &DailyBlock) -> Result<impl Iterator<Item = DailyRow> + '_, CoreError> {
    let mut columns = vec![
        ("time", block.time.len()),
        ("weather_code", block.weather_code.len()),
        ("precipitation_sum", block.precipitation_sum.len()),
        ("wind_speed_10m_max", block.wind_speed_10m_max.len()),
    ];
    if let Some(max) = &block.temperature_2m_max {
        columns.push(("temperature_2m_max", max.len()));
    }
    if let Some(min) = &block.temperature_2m_min {
        columns.push(("temperature_2m_min", min.len()));
    }
    ensure_aligned("daily", &columns)?;

    let column_at = |column: &Option<Vec<Option<f64>>>, i: usize| {
        column.as_ref().and_then(|c| c.get(i).copied().flatten())
    };

    Ok(block
        .time
        .iter()
        .zip(&block.weather_code)
        .zip(&block.precipitation_sum)
        .zip(&block.wind_speed_10m_max)
        .enumerate()
        .map(move |(i, (((date, code), precip), wind))| DailyRow {
            date: *date,
            weather_code: *code,
            precipitation_sum_mm: *precip,
            wind_speed_max_kmh: *wind,
            temperature_max_c: column_at(&block.temperature_2m_max, i),
            temperature_min_c: column_at(&block.temperature_2m_min, i),
        }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pollutant {
    Co,
    No2,
    O3,
    Pm2_5,
    Pm10,
    So2,
}

impl Pollutant {
    /// Legend order.
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Co,
        Pollutant::No2,
        Pollutant::O3,
        Pollutant::Pm2_5,
        Pollutant::Pm10,
        Pollutant::So2,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Pollutant::Co => "co",
            Pollutant::No2 => "no2",
            Pollutant::O3 => "o3",
            Pollutant::Pm2_5 => "pm2_5",
            Pollutant::Pm10 => "pm10",
            Pollutant::So2 => "so2",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Pollutant::Co => "CO",
            Pollutant::No2 => "NO2",
            Pollutant::O3 => "O3",
            Pollutant::Pm2_5 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::So2 => "SO2",
        }
    }

    /// WAQI spells PM2.5 as `pm25`.
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Pollutant::Pm2_5 => &["pm25"],
            _ => &[],
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pollutant concentrations in fixed [`Pollutant::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AqiComponents([(Pollutant, f64); 6]);

impl AqiComponents {
    pub fn iter(&self) -> impl Iterator<Item = (Pollutant, f64)> + '_ {
        self.0.iter().copied()
    }

    pub fn get(&self, pollutant: Pollutant) -> f64 {
        self.0
            .iter()
            .find(|(p, _)| *p == pollutant)
            .map(|(_, v)| *v)
            .unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.iter().map(|(_, v)| v).sum()
    }
}

/// Concentrations for the six charted pollutants; missing ones read 0.
pub fn aqi_components(block: &AqiBlock) -> AqiComponents {
    AqiComponents(Pollutant::ALL.map(|p| {
        let value = std::iter::once(p.key())
            .chain(p.aliases().iter().copied())
            .find_map(|key| block.components.get(key).and_then(AqiValue::value))
            .unwrap_or(0.0);
        (p, value)
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AqiBreakdown {
    pub index: Option<f64>,
    pub components: AqiComponents,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub observed_at: Option<String>,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub visibility: Option<Kilometers>,
    pub uv_index: Option<f64>,
}

pub fn current_conditions(block: &CurrentBlock) -> CurrentConditions {
    CurrentConditions {
        observed_at: block.time.clone(),
        temperature_c: block.temperature_2m,
        humidity_pct: block.relative_humidity_2m,
        precipitation_mm: block.precipitation,
        pressure_hpa: block.pressure_msl,
        wind_speed_kmh: block.wind_speed_10m,
        visibility: block.visibility.map(meters_to_kilometers),
        uv_index: block.uv_index,
    }
}

/// Everything a renderer needs for one forecast screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastView {
    pub location: String,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyRow>,
    pub daily: Vec<DailyRow>,
    pub aqi: AqiBreakdown,
    /// Backend model output, hourly from now; empty when the backend had
    /// enough observations and skipped the model.
    pub predicted_temperature: Vec<f64>,
}

pub trait ForecastNormalizer: Send + Sync {
    /// `location` is used when the payload does not echo its own name.
    fn normalize(&self, location: &str, payload: &ForecastPayload)
    -> Result<ForecastView, CoreError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardNormalizer;

impl ForecastNormalizer for StandardNormalizer {
    fn normalize(
        &self,
        location: &str,
        payload: &ForecastPayload,
    ) -> Result<ForecastView, CoreError> {
        let hourly = zip_hourly(&payload.hourly)?.collect();
        let daily = zip_daily(&payload.daily)?.collect();

        Ok(ForecastView {
            location: payload.location.clone().unwrap_or_else(|| location.to_string()),
            current: current_conditions(&payload.current),
            hourly,
            daily,
            aqi: AqiBreakdown {
                index: payload.aqi.index.as_ref().and_then(AqiValue::value),
                components: aqi_components(&payload.aqi),
            },
            predicted_temperature: payload
                .ml_prediction
                .as_ref()
                .map(|p| p.predicted_temperature.clone())
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> ForecastPayload {
        serde_json::from_value(value).expect("payload fixture should parse")
    }

    fn hourly(value: serde_json::Value) -> HourlyBlock {
        serde_json::from_value(value).expect("hourly fixture should parse")
    }

    fn daily(value: serde_json::Value) -> DailyBlock {
        serde_json::from_value(value).expect("daily fixture should parse")
    }

    #[test]
    fn kilometers_keep_exact_value_and_display_one_decimal() {
        let km = meters_to_kilometers(24_140.0);
        assert_eq!(km.value(), 24.14);
        assert_eq!(km.rounded(), 24.1);
        assert_eq!(km.to_string(), "24.1");
        assert_eq!(meters_to_kilometers(950.0).to_string(), "1.0");
        assert_eq!(meters_to_kilometers(0.0).to_string(), "0.0");
    }

    #[test]
    fn hourly_rows_are_index_aligned() {
        let block = hourly(json!({
            "time": ["2024-05-01T00:00", "2024-05-01T01:00", "2024-05-01T23:00"],
            "weather_code": [0, 45, 99],
            "temperature_2m": [26.5, 26.1, 28.0],
            "precipitation": [0.0, 0.0, 3.4]
        }));

        let rows: Vec<HourlyRow> = zip_hourly(&block).expect("aligned").collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].hour, 0);
        assert_eq!(rows[1].hour, 1);
        assert_eq!(rows[1].weather().icon_key, "cloud-fog");
        assert_eq!(rows[2].hour, 23);
        assert_eq!(rows[2].temperature_c, Some(28.0));
        assert_eq!(rows[2].precipitation_mm, Some(3.4));
    }

    #[test]
    fn hourly_length_mismatch_is_malformed() {
        let block = hourly(json!({
            "time": ["2024-05-01T00:00", "2024-05-01T01:00"],
            "weather_code": [0, 1],
            "temperature_2m": [26.5],
            "precipitation": [0.0, 0.0]
        }));

        let err = zip_hourly(&block).err().expect("mismatch must fail");
        match err {
            CoreError::MalformedPayload { section, detail } => {
                assert_eq!(section, "hourly");
                assert!(detail.contains("temperature_2m"), "detail: {detail}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_hourly_block_yields_nothing() {
        let rows: Vec<HourlyRow> = zip_hourly(&HourlyBlock::default()).expect("aligned").collect();
        assert!(rows.is_empty());
    }

    #[test]
    fn daily_rows_carry_optional_temperatures() {
        let block = daily(json!({
            "time": ["2024-05-01", "2024-05-02"],
            "weather_code": [3, 63],
            "precipitation_sum": [0.0, 12.5],
            "wind_speed_10m_max": [14.2, 22.0],
            "temperature_2m_max": [33.0, 31.2],
            "temperature_2m_min": [25.0, null]
        }));

        let rows: Vec<DailyRow> = zip_daily(&block).expect("aligned").collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2024, 5, 2).expect("valid date"));
        assert_eq!(rows[1].weather().description, "Moderate rain");
        assert_eq!(rows[1].precipitation_sum_mm, Some(12.5));
        assert_eq!(rows[1].wind_speed_max_kmh, Some(22.0));
        assert_eq!(rows[0].temperature_max_c, Some(33.0));
        assert_eq!(rows[1].temperature_min_c, None);
    }

    #[test]
    fn daily_without_temperature_columns_is_fine() {
        let block = daily(json!({
            "time": ["2024-05-01"],
            "weather_code": [0],
            "precipitation_sum": [0.0],
            "wind_speed_10m_max": [10.0]
        }));

        let rows: Vec<DailyRow> = zip_daily(&block).expect("aligned").collect();
        assert_eq!(rows[0].temperature_max_c, None);
    }

    #[test]
    fn daily_length_mismatch_is_malformed() {
        let block = daily(json!({
            "time": ["2024-05-01", "2024-05-02"],
            "weather_code": [0, 1],
            "precipitation_sum": [0.0, 0.0],
            "wind_speed_10m_max": [10.0, 12.0],
            "temperature_2m_max": [30.0]
        }));

        assert!(matches!(
            zip_daily(&block).err(),
            Some(CoreError::MalformedPayload { section: "daily", .. })
        ));
    }

    #[test]
    fn aqi_missing_components_default_to_zero_in_fixed_order() {
        let block: AqiBlock =
            serde_json::from_value(json!({ "components": { "co": 1.2 } })).expect("aqi");

        let components: Vec<(Pollutant, f64)> = aqi_components(&block).iter().collect();
        assert_eq!(
            components,
            vec![
                (Pollutant::Co, 1.2),
                (Pollutant::No2, 0.0),
                (Pollutant::O3, 0.0),
                (Pollutant::Pm2_5, 0.0),
                (Pollutant::Pm10, 0.0),
                (Pollutant::So2, 0.0),
            ]
        );
    }

    #[test]
    fn aqi_reads_waqi_readings_and_pm25_alias() {
        let block: AqiBlock = serde_json::from_value(json!({
            "index": 88,
            "components": { "pm25": { "v": 88 }, "o3": { "v": 12.5 }, "so2": "-" }
        }))
        .expect("aqi");

        let components = aqi_components(&block);
        assert_eq!(components.get(Pollutant::Pm2_5), 88.0);
        assert_eq!(components.get(Pollutant::O3), 12.5);
        assert_eq!(components.get(Pollutant::So2), 0.0);
        assert_eq!(components.total(), 100.5);
    }

    #[test]
    fn normalizer_builds_full_view() {
        let payload = payload(json!({
            "location": "Đà Nẵng",
            "current": {
                "time": "2024-05-01T13:00",
                "temperature_2m": 31.4,
                "relative_humidity_2m": 70,
                "pressure_msl": 1008.2,
                "wind_speed_10m": 12.0,
                "visibility": 24140.0,
                "uv_index": 8.1
            },
            "hourly": {
                "time": ["2024-05-01T13:00"],
                "weather_code": [2],
                "temperature_2m": [31.4],
                "precipitation": [0.0]
            },
            "daily": {
                "time": ["2024-05-01"],
                "weather_code": [2],
                "precipitation_sum": [0.0],
                "wind_speed_10m_max": [18.0]
            },
            "aqi": { "index": 42, "components": { "pm10": { "v": 20 } } },
            "ml_prediction": { "predicted_temperature": [31.0, 30.5] }
        }));

        let view = StandardNormalizer.normalize("ignored", &payload).expect("normalizes");
        assert_eq!(view.location, "Đà Nẵng");
        assert_eq!(view.current.humidity_pct, Some(70.0));
        assert_eq!(view.current.visibility.map(|v| v.to_string()), Some("24.1".to_string()));
        assert_eq!(view.hourly.len(), 1);
        assert_eq!(view.daily.len(), 1);
        assert_eq!(view.aqi.index, Some(42.0));
        assert_eq!(view.aqi.components.get(Pollutant::Pm10), 20.0);
        assert_eq!(view.predicted_temperature, vec![31.0, 30.5]);
    }

    #[test]
    fn normalizer_falls_back_to_requested_name() {
        let view = StandardNormalizer
            .normalize("Hà Nội", &ForecastPayload::default())
            .expect("empty payload normalizes");
        assert_eq!(view.location, "Hà Nội");
        assert!(view.predicted_temperature.is_empty());
        assert_eq!(view.aqi.components.total(), 0.0);
    }

    #[test]
    fn normalizer_surfaces_misaligned_arrays() {
        let payload = payload(json!({
            "hourly": { "time": ["2024-05-01T13:00"], "weather_code": [] }
        }));

        assert!(matches!(
            StandardNormalizer.normalize("Huế", &payload),
            Err(CoreError::MalformedPayload { section: "hourly", .. })
        ));
    }
}
