use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::geocode::NOMINATIM_URL;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_LOCATION: &str = "Hà Nội";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Which answer wins when a coordinate has both a reverse-geocoded region
/// name and a computed nearest location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationPrecedence {
    /// Use the geocoder's label whenever there is one.
    Geocoder,
    /// Use the geocoder's label only if it names a known location.
    #[default]
    GeocoderIfKnown,
    /// Never consult the geocoder.
    Nearest,
}

impl LocationPrecedence {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationPrecedence::Geocoder => "geocoder",
            LocationPrecedence::GeocoderIfKnown => "geocoder-if-known",
            LocationPrecedence::Nearest => "nearest",
        }
    }

    pub const fn all() -> &'static [LocationPrecedence] {
        &[
            LocationPrecedence::Geocoder,
            LocationPrecedence::GeocoderIfKnown,
            LocationPrecedence::Nearest,
        ]
    }
}

impl std::fmt::Display for LocationPrecedence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LocationPrecedence {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        LocationPrecedence::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| {
                anyhow!(
                    "Unknown location precedence '{value}'. \
                     Supported: geocoder, geocoder-if-known, nearest."
                )
            })
    }
}

/// Dashboard backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_API_URL.to_string(), timeout_secs: DEFAULT_TIMEOUT_SECS }
    }
}

/// Reverse-geocoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: NOMINATIM_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_location = "Hà Nội"
/// precedence = "geocoder-if-known"
///
/// [api]
/// base_url = "http://127.0.0.1:5000"
///
/// [geocoder]
/// enabled = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Used when no location or position is given.
    pub default_location: String,
    pub precedence: LocationPrecedence,
    pub api: ApiConfig,
    pub geocoder: GeocoderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_location: DEFAULT_LOCATION.to_string(),
            precedence: LocationPrecedence::default(),
            api: ApiConfig::default(),
            geocoder: GeocoderConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "stormwatch", "stormwatch")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder.timeout_secs)
    }
}
