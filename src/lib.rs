//! 5G numerology suggestions from OpenStreetMap data.
//!
//! This crate provides tools for:
//! - Building Overpass queries and fetching road and building data around a coordinate
//! - Aggregating speed limits and building heights into area statistics
//! - Estimating population density from building counts and floor counts
//! - Classifying an area into a subcarrier spacing, band and cyclic prefix
//! - Converting Overpass responses to GeoJSON
//!
//! # Example
//!
//! ```
//! use numerology_planner::processors::{classify, estimate_density};
//!
//! let density = estimate_density(4000, 3.0, 5000.0, 30).unwrap();
//! let config = classify(65.0, density, 3.0);
//! println!("{} / {} / {}", config.area_type, config.frequency, config.subcarrier);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod overpass;
pub mod processors;

pub use config::{ClassifierThresholds, DensityConfig, OutputConfig, PlannerConfig, QueryConfig};
pub use core::model::{AreaFeatureSet, Evaluation, RadioConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
