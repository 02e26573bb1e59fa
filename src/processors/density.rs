//! Population density estimation from building statistics.

use std::f64::consts::PI;

use thiserror::Error;

/// Default radius of the query circle in meters.
pub const DEFAULT_RADIUS_M: f64 = 5000.0;

/// Default number of occupants per building floor.
pub const DEFAULT_OCCUPANTS_PER_FLOOR: u32 = 30;

/// Errors for out-of-contract density inputs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DensityError {
    #[error("search radius must be positive and finite, got {0} m")]
    InvalidRadius(f64),

    #[error("average floor count must be non-negative and finite, got {0}")]
    InvalidFloors(f64),
}

/// Area of a circle of `radius_m` meters, in km².
#[inline]
pub fn circle_area_km2(radius_m: f64) -> f64 {
    let radius_km = radius_m / 1000.0;
    PI * radius_km * radius_km
}

/// Estimated people per km² within a circle of `radius_m`.
///
/// `population = building_count * avg_floors * occupants_per_floor`, spread
/// over the circle area. An `avg_floors` of zero (every level tag `"0"`)
/// gives zero density however many buildings were counted.
///
/// # Errors
///
/// Returns an error if `radius_m` is not strictly positive and finite, or if
/// `avg_floors` is negative or not finite.
///
/// # Example
///
/// ```
/// use numerology_planner::processors::density::estimate_density;
///
/// let density = estimate_density(0, 3.0, 5000.0, 30).unwrap();
/// assert_eq!(density, 0.0);
/// ```
pub fn estimate_density(
    building_count: usize,
    avg_floors: f64,
    radius_m: f64,
    occupants_per_floor: u32,
) -> Result<f64, DensityError> {
    if !(radius_m.is_finite() && radius_m > 0.0) {
        return Err(DensityError::InvalidRadius(radius_m));
    }
    if !(avg_floors.is_finite() && avg_floors >= 0.0) {
        return Err(DensityError::InvalidFloors(avg_floors));
    }

    let population = building_count as f64 * avg_floors * occupants_per_floor as f64;
    Ok(population / circle_area_km2(radius_m))
}
