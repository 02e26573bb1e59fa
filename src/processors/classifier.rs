//! Rule-based radio numerology classification.
//!
//! The decision table is evaluated top to bottom: the area type is chosen
//! from the population density alone, then the band and cyclic prefix from
//! the area type and floor count, then the subcarrier spacing from all three
//! inputs. The first matching row wins.

use thiserror::Error;

use crate::config::ClassifierThresholds;
use crate::core::model::{AreaType, CyclicPrefix, Frequency, RadioConfig, Subcarrier};

/// Errors for classifier inputs outside the supported domain.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("{name} must be non-negative and finite, got {value}")]
    OutOfDomain { name: &'static str, value: f64 },
}

/// Reject negative or non-finite classifier inputs.
///
/// The decision table itself accepts any number; this check belongs at the
/// boundary where inputs enter the planner.
pub fn validate_inputs(
    avg_speed: f64,
    population_density: f64,
    avg_floors: f64,
) -> Result<(), ClassifyError> {
    for (name, value) in [
        ("avg_speed", avg_speed),
        ("population_density", population_density),
        ("avg_floors", avg_floors),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(ClassifyError::OutOfDomain { name, value });
        }
    }
    Ok(())
}

/// Area type from population density (people/km²).
pub fn classify_area(population_density: f64, thresholds: &ClassifierThresholds) -> AreaType {
    if population_density >= thresholds.big_capital_density {
        AreaType::BigCapital
    } else if population_density >= thresholds.urban_density {
        AreaType::Urban
    } else {
        AreaType::RuralMountain
    }
}

/// Frequency band and cyclic prefix for an area.
pub fn select_band(
    area_type: AreaType,
    avg_floors: f64,
    thresholds: &ClassifierThresholds,
) -> (Frequency, CyclicPrefix) {
    match area_type {
        AreaType::BigCapital if avg_floors < thresholds.floor_split => {
            (Frequency::Ghz3_5, CyclicPrefix::Normal)
        }
        AreaType::BigCapital => (Frequency::Ghz3_0, CyclicPrefix::Normal),
        AreaType::Urban => (Frequency::Mhz700, CyclicPrefix::Extended),
        AreaType::RuralMountain => (Frequency::Mhz500, CyclicPrefix::Extended),
    }
}

/// Subcarrier spacing for an area.
///
/// Low-rise big capitals use inclusive/exclusive bounds (`>= high`,
/// `< mid`); every other row uses strict `>` comparisons.
pub fn select_subcarrier(
    area_type: AreaType,
    avg_speed: f64,
    avg_floors: f64,
    thresholds: &ClassifierThresholds,
) -> Subcarrier {
    let high = thresholds.high_speed_kmh;
    let mid = thresholds.mid_speed_kmh;
    let low_rise = avg_floors < thresholds.floor_split;

    match (area_type, low_rise) {
        (AreaType::BigCapital, true) => {
            if avg_speed >= high {
                Subcarrier::Khz60
            } else if avg_speed < mid {
                Subcarrier::Khz30
            } else {
                Subcarrier::Khz15
            }
        }
        (AreaType::BigCapital, false) => {
            if avg_speed > high {
                Subcarrier::Khz30
            } else {
                Subcarrier::Khz15
            }
        }
        (AreaType::Urban, false) => {
            if avg_speed > high {
                Subcarrier::Khz60
            } else {
                Subcarrier::Khz30
            }
        }
        (AreaType::Urban, true) | (AreaType::RuralMountain, _) => {
            if avg_speed > high {
                Subcarrier::Khz120
            } else if avg_speed > mid {
                Subcarrier::Khz60
            } else {
                Subcarrier::Khz30
            }
        }
    }
}

/// Classify with explicit thresholds.
pub fn classify_with(
    avg_speed: f64,
    population_density: f64,
    avg_floors: f64,
    thresholds: &ClassifierThresholds,
) -> RadioConfig {
    let area_type = classify_area(population_density, thresholds);
    let (frequency, cyclic_prefix) = select_band(area_type, avg_floors, thresholds);
    let subcarrier = select_subcarrier(area_type, avg_speed, avg_floors, thresholds);

    RadioConfig {
        subcarrier,
        frequency,
        cyclic_prefix,
        area_type,
    }
}

/// Classify with the default thresholds (5000 / 1000 people/km², 3 floors,
/// 70 / 50 km/h).
///
/// # Example
///
/// ```
/// use numerology_planner::core::model::{AreaType, Frequency, Subcarrier};
/// use numerology_planner::processors::classifier::classify;
///
/// let config = classify(80.0, 6000.0, 2.0);
/// assert_eq!(config.area_type, AreaType::BigCapital);
/// assert_eq!(config.frequency, Frequency::Ghz3_5);
/// assert_eq!(config.subcarrier, Subcarrier::Khz60);
/// ```
pub fn classify(avg_speed: f64, population_density: f64, avg_floors: f64) -> RadioConfig {
    classify_with(
        avg_speed,
        population_density,
        avg_floors,
        &ClassifierThresholds::default(),
    )
}
