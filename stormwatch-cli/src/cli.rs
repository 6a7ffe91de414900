use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Select, Text};
use stormwatch_core::{
    Config, Coordinate, Dashboard, HaversineResolver, HttpDashboardApi, LocationPrecedence,
    LocationQuery, NoGeocoder, NominatimGeocoder, ReverseGeocoder, StandardNormalizer,
};

use crate::render::{self, AqiChart};

type LiveDashboard =
    Dashboard<HttpDashboardApi, Box<dyn ReverseGeocoder>, HaversineResolver, StandardNormalizer>;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "stormwatch", version, about = "Weather and storm dashboard client")]
pub struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Dashboard backend URL, overriding the config file.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively edit the configuration file.
    Configure,

    /// List the locations the backend knows about.
    Locations,

    /// Print the known location nearest to a coordinate.
    Nearest {
        #[arg(long, allow_negative_numbers = true, value_parser = parse_lat)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true, value_parser = parse_lon)]
        lon: f64,
    },

    /// Show the forecast for a location, a position, or the default location.
    Forecast {
        /// Location name as listed by `stormwatch locations`.
        #[arg(conflicts_with_all = ["lat", "lon"])]
        location: Option<String>,

        /// Latitude of the current position.
        #[arg(long, requires = "lon", allow_negative_numbers = true, value_parser = parse_lat)]
        lat: Option<f64>,

        /// Longitude of the current position.
        #[arg(long, requires = "lat", allow_negative_numbers = true, value_parser = parse_lon)]
        lon: Option<f64>,

        /// Print the normalized forecast as JSON.
        #[arg(long)]
        json: bool,

        /// Re-fetch and redraw every SECS seconds.
        #[arg(long, value_name = "SECS", conflicts_with = "json")]
        refresh: Option<u64>,
    },

    /// Show the storm outlook.
    Storm {
        /// Print the outlook as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn parse_degrees(s: &str, limit: f64) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if value.is_finite() && (-limit..=limit).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside [-{limit}, {limit}]"))
    }
}

fn parse_lat(s: &str) -> Result<f64, String> {
    parse_degrees(s, 90.0)
}

fn parse_lon(s: &str) -> Result<f64, String> {
    parse_degrees(s, 180.0)
}

fn build_dashboard(config: &Config) -> Result<LiveDashboard> {
    let api = HttpDashboardApi::new(&config.api.base_url, config.api_timeout())
        .context("Failed to set up the dashboard API client")?;

    let geocoder: Box<dyn ReverseGeocoder> = if config.geocoder.enabled {
        Box::new(
            NominatimGeocoder::new(&config.geocoder.base_url, config.geocoder_timeout())
                .context("Failed to set up the geocoding client")?,
        )
    } else {
        Box::new(NoGeocoder)
    };

    Ok(Dashboard::new(api, geocoder, HaversineResolver, StandardNormalizer)
        .with_precedence(config.precedence)
        .with_default_location(config.default_location.clone()))
}

fn configure(mut config: Config) -> Result<()> {
    config.api.base_url = Text::new("Dashboard API URL:")
        .with_default(&config.api.base_url)
        .prompt()?;

    config.default_location = Text::new("Default location:")
        .with_default(&config.default_location)
        .prompt()?;

    config.geocoder.enabled = Confirm::new("Use reverse geocoding for positions?")
        .with_default(config.geocoder.enabled)
        .prompt()?;

    if config.geocoder.enabled {
        let options = LocationPrecedence::all().to_vec();
        let cursor = options.iter().position(|p| *p == config.precedence).unwrap_or(0);
        config.precedence = Select::new("When the geocoder and nearest location disagree, prefer:", options)
            .with_starting_cursor(cursor)
            .prompt()?;
    }

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;
        if let Some(url) = self.api_url {
            config.api.base_url = url;
        }

        match self.command {
            Command::Configure => configure(config)?,
            Command::Locations => {
                let dashboard = build_dashboard(&config)?;
                let locations = dashboard.locations().await?;
                print!("{}", render::render_locations(&locations)?);
            }
            Command::Nearest { lat, lon } => {
                let dashboard = build_dashboard(&config)?;
                let nearest = dashboard.nearest(Coordinate::new(lat, lon)).await?;
                println!("{}", nearest.name);
            }
            Command::Forecast { location, lat, lon, json, refresh } => {
                let query = match (location, lat, lon) {
                    (Some(name), _, _) => LocationQuery::Named(name),
                    (None, Some(lat), Some(lon)) => LocationQuery::Position(Coordinate::new(lat, lon)),
                    _ => LocationQuery::Default,
                };
                let dashboard = build_dashboard(&config)?;

                if json {
                    let view = dashboard.forecast(&query).await?;
                    println!("{}", serde_json::to_string_pretty(&view)?);
                } else {
                    show_forecast(&dashboard, &query, refresh.map(Duration::from_secs)).await?;
                }
            }
            Command::Storm { json } => {
                let dashboard = build_dashboard(&config)?;
                let outlook = dashboard.storm_outlook().await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&outlook)?);
                } else {
                    print!("{}", render::render_storm(&outlook)?);
                }
            }
        }

        Ok(())
    }
}

/// Fetch and draw once, or keep redrawing every `refresh` until interrupted.
/// While refreshing, a failed fetch is logged and retried on the next tick.
async fn show_forecast(
    dashboard: &LiveDashboard,
    query: &LocationQuery,
    refresh: Option<Duration>,
) -> Result<()> {
    let mut chart = AqiChart::default();

    loop {
        match dashboard.forecast(query).await {
            Ok(view) => {
                let (text, next) = render::render_forecast(&view, chart)?;
                chart = next;
                print!("{text}");
            }
            Err(e) if refresh.is_some() => {
                tracing::error!("Failed to load forecast: {e}");
            }
            Err(e) => return Err(e.into()),
        }

        let Some(every) = refresh else {
            return Ok(());
        };
        println!("-- updated {} --", chrono::Local::now().format("%H:%M:%S"));
        tokio::time::sleep(every).await;
    }
}
