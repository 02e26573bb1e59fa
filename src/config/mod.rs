//! Configuration types for the numerology planner.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::overpass::client::DEFAULT_MAX_BODY_BYTES;
use crate::processors::density::{DEFAULT_OCCUPANTS_PER_FLOOR, DEFAULT_RADIUS_M};

/// Configuration for Overpass queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Overpass interpreter endpoint
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Largest response body accepted from Overpass, in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,

    /// Search radius in meters used when estimating a configuration
    #[serde(default = "default_estimate_radius")]
    pub estimate_radius_m: u32,

    /// Search radius in meters used by `extract` in dynamic mode
    #[serde(default = "default_extract_radius")]
    pub extract_radius_m: u32,

    /// Area name used by `extract` in static mode
    #[serde(default = "default_area")]
    pub default_area: String,
}

fn default_overpass_url() -> String {
    "http://overpass-api.de/api/interpreter".to_string()
}

fn default_timeout_secs() -> u64 {
    25
}

fn default_max_body_bytes() -> u64 {
    DEFAULT_MAX_BODY_BYTES
}

fn default_estimate_radius() -> u32 {
    5000
}

fn default_extract_radius() -> u32 {
    500
}

fn default_area() -> String {
    "Paris".to_string()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            overpass_url: default_overpass_url(),
            timeout_secs: default_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
            estimate_radius_m: default_estimate_radius(),
            extract_radius_m: default_extract_radius(),
            default_area: default_area(),
        }
    }
}

/// Configuration for population density estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DensityConfig {
    /// Radius of the circular area the building counts cover, in meters
    #[serde(default = "default_density_radius")]
    pub radius_m: f64,

    /// Assumed number of occupants per building floor
    #[serde(default = "default_occupants_per_floor")]
    pub occupants_per_floor: u32,
}

fn default_density_radius() -> f64 {
    DEFAULT_RADIUS_M
}

fn default_occupants_per_floor() -> u32 {
    DEFAULT_OCCUPANTS_PER_FLOOR
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            radius_m: default_density_radius(),
            occupants_per_floor: default_occupants_per_floor(),
        }
    }
}

/// Thresholds of the classification decision table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// Density (people/km²) at or above which an area is a big capital
    #[serde(default = "default_big_capital_density")]
    pub big_capital_density: f64,

    /// Density at or above which an area is urban
    #[serde(default = "default_urban_density")]
    pub urban_density: f64,

    /// Average floor count at or above which buildings count as tall
    #[serde(default = "default_floor_split")]
    pub floor_split: f64,

    /// Upper speed threshold in km/h
    #[serde(default = "default_high_speed")]
    pub high_speed_kmh: f64,

    /// Lower speed threshold in km/h
    #[serde(default = "default_mid_speed")]
    pub mid_speed_kmh: f64,
}

fn default_big_capital_density() -> f64 {
    5000.0
}

fn default_urban_density() -> f64 {
    1000.0
}

fn default_floor_split() -> f64 {
    3.0
}

fn default_high_speed() -> f64 {
    70.0
}

fn default_mid_speed() -> f64 {
    50.0
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            big_capital_density: default_big_capital_density(),
            urban_density: default_urban_density(),
            floor_split: default_floor_split(),
            high_speed_kmh: default_high_speed(),
            mid_speed_kmh: default_mid_speed(),
        }
    }
}

/// Configuration for generated files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for extracted JSON and GeoJSON files
    #[serde(default = "default_output_dir")]
    pub directory: String,
}

fn default_output_dir() -> String {
    "output".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
        }
    }
}

/// Main planner configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub density: DensityConfig,

    #[serde(default)]
    pub thresholds: ClassifierThresholds,

    #[serde(default)]
    pub output: OutputConfig,
}

impl PlannerConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PlannerConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
