//! Road and building feature aggregation.
//!
//! Reduces raw OSM tag samples to the scalar statistics the density
//! estimator and classifier work with. Missing or malformed tags never
//! fail: an unparseable `maxspeed` is replaced by the default speed, while
//! an unparseable level count is skipped.

use log::debug;

use crate::core::model::{
    AreaFeatureSet, BuildingFeatures, BuildingTagSample, RoadFeatures, RoadTagSample,
    DEFAULT_FLOORS, DEFAULT_SPEED_KMH,
};

/// Parse an integer tag value.
///
/// Accepts an optional sign and surrounding whitespace. Values such as
/// `"walk"`, `"30 mph"` or `"2.5"` are not integers.
pub fn parse_int_tag(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

/// Speed of a single `maxspeed` value, substituting the default for
/// qualitative or non-integer values.
pub fn parse_speed_limit(value: &str) -> f64 {
    parse_int_tag(value)
        .map(|v| v as f64)
        .unwrap_or(DEFAULT_SPEED_KMH)
}

/// Level count of a single building, preferring `building:levels` over
/// `levels`.
///
/// The fallback only applies when `building:levels` is absent; a present but
/// malformed `building:levels` yields `None`.
pub fn parse_levels(sample: &BuildingTagSample) -> Option<i64> {
    sample
        .get("building:levels")
        .or_else(|| sample.get("levels"))
        .and_then(|v| parse_int_tag(v))
}

fn mean(sum: f64, count: usize) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Average speed limit and road count.
///
/// The mean covers every sample that carries `maxspeed`, after
/// substitution. With no such sample the average is 50 km/h.
///
/// # Example
///
/// ```
/// use numerology_planner::processors::features::aggregate_road_features;
/// use std::collections::HashMap;
///
/// let road: HashMap<String, String> = [("maxspeed".to_string(), "walk".to_string())].into();
/// let features = aggregate_road_features(&[road]);
/// assert_eq!(features.avg_speed, 50.0);
/// assert_eq!(features.road_count, 1);
/// ```
pub fn aggregate_road_features(samples: &[RoadTagSample]) -> RoadFeatures {
    let (sum, tagged) = samples
        .iter()
        .filter_map(|s| s.get("maxspeed"))
        .map(|v| parse_speed_limit(v))
        .fold((0.0, 0usize), |(sum, n), speed| (sum + speed, n + 1));

    let avg_speed = mean(sum, tagged).unwrap_or(DEFAULT_SPEED_KMH);
    debug!(
        "Roads: {} samples, {} with maxspeed, avg {:.1} km/h",
        samples.len(),
        tagged,
        avg_speed
    );

    RoadFeatures {
        avg_speed,
        road_count: samples.len(),
    }
}

/// Building count and average floor count.
///
/// Only samples with a parseable level tag contribute to the mean. With no
/// such sample the average is 1 floor.
pub fn aggregate_building_features(samples: &[BuildingTagSample]) -> BuildingFeatures {
    let (sum, collected) = samples
        .iter()
        .filter_map(parse_levels)
        .fold((0.0, 0usize), |(sum, n), levels| (sum + levels as f64, n + 1));

    let avg_floors = mean(sum, collected).unwrap_or(DEFAULT_FLOORS);
    debug!(
        "Buildings: {} samples, {} with levels, avg {:.2} floors",
        samples.len(),
        collected,
        avg_floors
    );

    BuildingFeatures {
        building_count: samples.len(),
        avg_floors,
    }
}

/// Aggregate both sample lists into one feature set.
pub fn aggregate_area(roads: &[RoadTagSample], buildings: &[BuildingTagSample]) -> AreaFeatureSet {
    AreaFeatureSet::new(
        aggregate_road_features(roads),
        aggregate_building_features(buildings),
    )
}
