//! Application Configuration
//! TOML settings file with command-line overrides, resolved once at startup.

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_DATA_SOURCE: &str = "data/schools.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid map zoom thresholds: clustered ({clustered}) must not exceed individual ({individual})")]
    ZoomThresholds { clustered: f64, individual: f64 },
}

/// Command-line arguments.
#[derive(Parser, Debug, Default)]
#[command(name = "enrollment_viewer", version, about = "School enrollment utilization viewer")]
pub struct Cli {
    /// Path to a TOML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Dataset location (file path or http(s) URL)
    #[arg(short, long)]
    pub data: Option<String>,

    /// Year selected at startup
    #[arg(short, long)]
    pub year: Option<String>,

    /// Disable the table view
    #[arg(long)]
    pub no_table: bool,

    /// Disable the chart view
    #[arg(long)]
    pub no_chart: bool,

    /// Disable the map view
    #[arg(long)]
    pub no_map: bool,
}

/// Which optional views are enabled.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    pub table: bool,
    pub chart: bool,
    pub map: bool,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            table: true,
            chart: true,
            map: true,
        }
    }
}

/// Map zoom thresholds and the district marker position.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Zoom level at or above which schools are drawn individually
    pub individual_zoom: f64,
    /// Zoom level at or above which clusters are drawn
    pub clustered_zoom: f64,
    /// `[lat, lng]` of the district-wide marker
    pub district_center: Option<[f64; 2]>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            individual_zoom: 14.0,
            clustered_zoom: 12.0,
            district_center: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1400.0,
            height: 800.0,
            title: "School Enrollment Utilization".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_source: String,
    /// Year selected at startup, defaults to the last declared year
    pub default_year: Option<String>,
    pub views: ViewsConfig,
    pub map: MapConfig,
    pub window: WindowConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_source: DEFAULT_DATA_SOURCE.to_string(),
            default_year: None,
            views: ViewsConfig::default(),
            map: MapConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Load the settings file named on the command line and apply overrides.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => {
                log::info!("Reading config from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(data) = &cli.data {
            self.data_source = data.clone();
        }
        if let Some(year) = &cli.year {
            self.default_year = Some(year.clone());
        }
        if cli.no_table {
            self.views.table = false;
        }
        if cli.no_chart {
            self.views.chart = false;
        }
        if cli.no_map {
            self.views.map = false;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.map.clustered_zoom > self.map.individual_zoom {
            return Err(ConfigError::ZoomThresholds {
                clustered: self.map.clustered_zoom,
                individual: self.map.individual_zoom,
            });
        }
        Ok(())
    }
}
