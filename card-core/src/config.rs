use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::theme::ThemeName;

/// Dataset id of the real-time station observation feed.
pub const OBSERVATION_DATASET: &str = "O-A0003-001";

/// Dataset id of the 36-hour regional forecast feed.
pub const FORECAST_DATASET: &str = "F-C0032-001";

/// Per-request HTTP timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// One fixed CWB datastore query: which dataset, authorised how, for which place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    pub authorization: String,
    pub location_name: String,
}

impl Endpoint {
    pub fn url(&self, dataset: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), dataset)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// authorization = "CWB-..."
/// station_name = "臺北"
/// region_name = "臺北市"
/// theme = "dark"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Open data authorization key issued by the weather bureau.
    pub authorization: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Observation station used for current conditions.
    #[serde(default = "default_station_name")]
    pub station_name: String,

    /// County/city used for the forecast.
    #[serde(default = "default_region_name")]
    pub region_name: String,

    #[serde(default)]
    pub theme: ThemeName,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://opendata.cwb.gov.tw/api/v1/rest/datastore".to_string()
}

fn default_station_name() -> String {
    "臺北".to_string()
}

fn default_region_name() -> String {
    "臺北市".to_string()
}

const fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            authorization: None,
            base_url: default_base_url(),
            station_name: default_station_name(),
            region_name: default_region_name(),
            theme: ThemeName::default(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-card", "weather-card")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn authorization_key(&self) -> Result<&str> {
        self.authorization
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No authorization key configured.\n\
                     Hint: run `weather-card configure` and enter your CWB open data key."
                )
            })
    }

    pub fn set_authorization(&mut self, key: String) {
        self.authorization = Some(key);
    }

    pub fn observation_endpoint(&self) -> Result<Endpoint> {
        self.endpoint(&self.station_name)
    }

    pub fn forecast_endpoint(&self) -> Result<Endpoint> {
        self.endpoint(&self.region_name)
    }

    fn endpoint(&self, location_name: &str) -> Result<Endpoint> {
        Ok(Endpoint {
            base_url: self.base_url.clone(),
            authorization: self.authorization_key()?.to_owned(),
            location_name: location_name.to_owned(),
        })
    }
}
