//! Value types shared by the aggregation, density and classification stages.
//!
//! Everything here is a transient value object: built for one evaluation and
//! dropped once the report is written.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tag map of a single road segment. Only `maxspeed` is read.
pub type RoadTagSample = HashMap<String, String>;

/// Tag map of a single building. Only `building:levels` and `levels` are read.
pub type BuildingTagSample = HashMap<String, String>;

/// Speed assumed for roads with no usable `maxspeed`, in km/h.
pub const DEFAULT_SPEED_KMH: f64 = 50.0;

/// Floor count assumed when no building carries a usable level tag.
pub const DEFAULT_FLOORS: f64 = 1.0;

/// Road statistics for one query area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoadFeatures {
    pub avg_speed: f64,
    pub road_count: usize,
}

/// Building statistics for one query area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingFeatures {
    pub building_count: usize,
    pub avg_floors: f64,
}

/// Aggregated summary of roads and buildings around a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaFeatureSet {
    /// Mean speed limit in km/h.
    pub avg_speed: f64,
    pub road_count: usize,
    pub building_count: usize,
    /// Mean number of floors over buildings with a parseable level tag.
    pub avg_floors: f64,
}

impl AreaFeatureSet {
    /// Combines road and building statistics into one record.
    pub fn new(roads: RoadFeatures, buildings: BuildingFeatures) -> Self {
        Self {
            avg_speed: roads.avg_speed,
            road_count: roads.road_count,
            building_count: buildings.building_count,
            avg_floors: buildings.avg_floors,
        }
    }
}

impl Default for AreaFeatureSet {
    fn default() -> Self {
        Self {
            avg_speed: DEFAULT_SPEED_KMH,
            road_count: 0,
            building_count: 0,
            avg_floors: DEFAULT_FLOORS,
        }
    }
}

/// Coarse density-derived classification of an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaType {
    BigCapital,
    Urban,
    RuralMountain,
}

impl AreaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaType::BigCapital => "BigCapital",
            AreaType::Urban => "Urban",
            AreaType::RuralMountain => "RuralMountain",
        }
    }
}

/// OFDM subcarrier spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subcarrier {
    #[serde(rename = "15kHz")]
    Khz15,
    #[serde(rename = "30kHz")]
    Khz30,
    #[serde(rename = "60kHz")]
    Khz60,
    #[serde(rename = "120kHz")]
    Khz120,
}

impl Subcarrier {
    /// Spacing in kHz.
    pub fn khz(&self) -> u32 {
        15 << self.numerology()
    }

    /// 5G numerology index `mu`, where spacing is `15 kHz * 2^mu`.
    pub fn numerology(&self) -> u32 {
        match self {
            Subcarrier::Khz15 => 0,
            Subcarrier::Khz30 => 1,
            Subcarrier::Khz60 => 2,
            Subcarrier::Khz120 => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Subcarrier::Khz15 => "15kHz",
            Subcarrier::Khz30 => "30kHz",
            Subcarrier::Khz60 => "60kHz",
            Subcarrier::Khz120 => "120kHz",
        }
    }
}

/// Carrier frequency band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "500MHz")]
    Mhz500,
    #[serde(rename = "700MHz")]
    Mhz700,
    #[serde(rename = "3.0GHz")]
    Ghz3_0,
    #[serde(rename = "3.5GHz")]
    Ghz3_5,
}

impl Frequency {
    /// Carrier frequency in MHz.
    pub fn mhz(&self) -> u32 {
        match self {
            Frequency::Mhz500 => 500,
            Frequency::Mhz700 => 700,
            Frequency::Ghz3_0 => 3_000,
            Frequency::Ghz3_5 => 3_500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Mhz500 => "500MHz",
            Frequency::Mhz700 => "700MHz",
            Frequency::Ghz3_0 => "3.0GHz",
            Frequency::Ghz3_5 => "3.5GHz",
        }
    }
}

/// Guard interval length preceding each OFDM symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CyclicPrefix {
    Normal,
    Extended,
}

impl CyclicPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            CyclicPrefix::Normal => "Normal",
            CyclicPrefix::Extended => "Extended",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(AreaType, Subcarrier, Frequency, CyclicPrefix);

/// Suggested radio numerology for an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RadioConfig {
    pub subcarrier: Subcarrier,
    pub frequency: Frequency,
    pub cyclic_prefix: CyclicPrefix,
    pub area_type: AreaType,
}

/// Errors for coordinates outside the WGS84 range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting NaN and out-of-range values.
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::Latitude(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::Longitude(lon));
        }
        Ok(Self { lat, lon })
    }
}

/// Formats as `{lat}_{lon}`, always with a decimal point (`48.0_2.0`).
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}_{:?}", self.lat, self.lon)
    }
}

/// Result of one end-to-end evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub coordinate: Option<Coordinate>,
    pub radius_m: f64,
    pub features: AreaFeatureSet,
    pub population_density: f64,
    pub config: RadioConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subcarrier_numerology() {
        assert_eq!(Subcarrier::Khz15.khz(), 15);
        assert_eq!(Subcarrier::Khz30.khz(), 30);
        assert_eq!(Subcarrier::Khz60.khz(), 60);
        assert_eq!(Subcarrier::Khz120.khz(), 120);
        assert_eq!(Subcarrier::Khz120.numerology(), 3);
    }

    #[test]
    fn test_enum_labels_serialize() {
        let config = RadioConfig {
            subcarrier: Subcarrier::Khz60,
            frequency: Frequency::Ghz3_5,
            cyclic_prefix: CyclicPrefix::Normal,
            area_type: AreaType::BigCapital,
        };
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["subcarrier"], "60kHz");
        assert_eq!(json["frequency"], "3.5GHz");
        assert_eq!(json["cyclic_prefix"], "Normal");
        assert_eq!(json["area_type"], "BigCapital");
    }

    #[test]
    fn test_display_matches_serde_label() {
        assert_eq!(Frequency::Ghz3_0.to_string(), "3.0GHz");
        assert_eq!(AreaType::RuralMountain.to_string(), "RuralMountain");
        assert_eq!(Subcarrier::Khz15.to_string(), "15kHz");
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(48.85, 2.35).is_ok());
        assert_eq!(Coordinate::new(91.0, 0.0), Err(CoordinateError::Latitude(91.0)));
        assert_eq!(
            Coordinate::new(0.0, -181.0),
            Err(CoordinateError::Longitude(-181.0))
        );
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_coordinate_display_keeps_decimal_point() {
        assert_eq!(Coordinate::new(48.0, 2.0).unwrap().to_string(), "48.0_2.0");
        assert_eq!(Coordinate::new(-33.9, 18.4).unwrap().to_string(), "-33.9_18.4");
    }

    #[test]
    fn test_default_feature_set() {
        let features = AreaFeatureSet::default();
        assert_eq!(features.avg_speed, 50.0);
        assert_eq!(features.avg_floors, 1.0);
        assert_eq!(features.building_count, 0);
    }
}
