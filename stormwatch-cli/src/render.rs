//! Plain-text rendering of dashboard data.

use std::fmt::{self, Write};

use stormwatch_core::{
    AqiComponents, ForecastView, Location, Pollutant, StormOutlook,
    normalize::{AqiBreakdown, CurrentConditions},
};

const BAR_WIDTH: usize = 30;

fn value_or_dash(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v}{unit}"),
        None => "-".to_string(),
    }
}

pub fn render_locations(locations: &[Location]) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let width = locations.iter().map(|l| l.name.chars().count()).max().unwrap_or(0);

    for loc in locations {
        writeln!(out, "{:<width$}  {:>8.4}  {:>9.4}", loc.name, loc.lat, loc.lon)?;
    }
    writeln!(out, "{} locations", locations.len())?;
    Ok(out)
}

/// The AQI breakdown chart. Keeps the last readings so a refreshed render
/// can show which way each pollutant moved.
#[derive(Debug, Default)]
pub struct AqiChart {
    previous: Option<AqiComponents>,
}

impl AqiChart {
    /// Draw `aqi` and return the chart state to use for the next render.
    pub fn render(self, out: &mut impl Write, aqi: &AqiBreakdown) -> Result<AqiChart, fmt::Error> {
        match aqi.index {
            Some(index) => writeln!(out, "Air quality (AQI {index})")?,
            None => writeln!(out, "Air quality")?,
        }

        let total = aqi.components.total();
        for (pollutant, value) in aqi.components.iter() {
            let share = if total > 0.0 { value / total } else { 0.0 };
            let filled = (share * BAR_WIDTH as f64).round() as usize;
            writeln!(
                out,
                "  {:<5} {:<width$} {:>8.1} {}",
                pollutant.label(),
                "#".repeat(filled),
                value,
                self.trend(pollutant, value),
                width = BAR_WIDTH,
            )?;
        }

        Ok(AqiChart { previous: Some(aqi.components) })
    }

    fn trend(&self, pollutant: Pollutant, value: f64) -> &'static str {
        match self.previous.map(|p| p.get(pollutant)) {
            Some(before) if value > before => "↑",
            Some(before) if value < before => "↓",
            Some(_) => "=",
            None => "",
        }
    }
}

fn write_current(out: &mut impl Write, current: &CurrentConditions) -> fmt::Result {
    writeln!(out, "Now")?;
    writeln!(out, "  Temperature  {}", value_or_dash(current.temperature_c, " °C"))?;
    writeln!(out, "  Humidity     {}", value_or_dash(current.humidity_pct, " %"))?;
    writeln!(out, "  Pressure     {}", value_or_dash(current.pressure_hpa, " hPa"))?;
    writeln!(out, "  Wind         {}", value_or_dash(current.wind_speed_kmh, " km/h"))?;
    match current.visibility {
        Some(km) => writeln!(out, "  Visibility   {km} km")?,
        None => writeln!(out, "  Visibility   -")?,
    }
    writeln!(out, "  UV index     {}", value_or_dash(current.uv_index, ""))
}

/// Render a full forecast screen. The chart state is threaded through so
/// repeated renders can compare against the previous one.
pub fn render_forecast(view: &ForecastView, chart: AqiChart) -> Result<(String, AqiChart), fmt::Error> {
    let mut out = String::new();

    writeln!(out, "== {} ==", view.location)?;
    if let Some(at) = &view.current.observed_at {
        writeln!(out, "Observed {at}")?;
    }
    writeln!(out)?;
    write_current(&mut out, &view.current)?;

    writeln!(out)?;
    writeln!(out, "{:<6} {:<32} {:>9} {:>9}", "Hour", "Weather", "Temp", "Rain")?;
    for row in &view.hourly {
        let weather = row.weather();
        writeln!(
            out,
            "{:<6} {:<32} {:>9} {:>9}",
            format!("{}:00", row.hour),
            format!("[{}] {}", weather.icon_key, weather.description),
            value_or_dash(row.temperature_c, "°C"),
            value_or_dash(row.precipitation_mm, " mm"),
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{:<11} {:<32} {:>13} {:>9} {:>11}", "Date", "Weather", "Temp", "Rain", "Wind")?;
    for row in &view.daily {
        let weather = row.weather();
        let temp = match (row.temperature_min_c, row.temperature_max_c) {
            (Some(min), Some(max)) => format!("{min}-{max}°C"),
            (None, Some(max)) => format!("{max}°C"),
            _ => "-".to_string(),
        };
        writeln!(
            out,
            "{:<11} {:<32} {:>13} {:>9} {:>11}",
            row.date.format("%d/%m/%Y").to_string(),
            format!("[{}] {}", weather.icon_key, weather.description),
            temp,
            value_or_dash(row.precipitation_sum_mm, " mm"),
            value_or_dash(row.wind_speed_max_kmh, " km/h"),
        )?;
    }

    writeln!(out)?;
    let chart = chart.render(&mut out, &view.aqi)?;

    if !view.predicted_temperature.is_empty() {
        writeln!(out)?;
        let temps: Vec<String> =
            view.predicted_temperature.iter().map(|t| format!("{t:.1}")).collect();
        writeln!(out, "Model temperature outlook (°C, hourly): {}", temps.join(" "))?;
    }

    Ok((out, chart))
}

pub fn render_storm(outlook: &StormOutlook) -> Result<String, fmt::Error> {
    let mut out = String::new();

    match outlook {
        StormOutlook::NoStorm { message } => writeln!(out, "{message}")?,
        StormOutlook::Storm(storm) => {
            writeln!(out, "Storm center  {:.2}, {:.2}", storm.center.lat, storm.center.lon)?;
            if let Some(warning) = &storm.warning {
                writeln!(out, "Warning       {warning}")?;
            }
            writeln!(out, "Landfall      {}", if storm.landfall_expected { "yes" } else { "no" })?;
            writeln!(out, "Track")?;
            for (i, point) in storm.track.iter().enumerate() {
                writeln!(out, "  {i:>2}  {:>7.2}  {:>8.2}", point.lat, point.lon)?;
            }
        }
    }

    Ok(out)
}
