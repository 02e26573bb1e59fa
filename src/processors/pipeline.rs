//! End-to-end evaluation: tag samples to radio configuration.

use log::{debug, info};
use thiserror::Error;

use crate::config::PlannerConfig;
use crate::core::loaders::{building_samples, road_samples, OverpassResponse};
use crate::core::model::{BuildingTagSample, Coordinate, Evaluation, RoadTagSample};

use super::classifier::{classify_with, validate_inputs, ClassifyError};
use super::density::{estimate_density, DensityError};
use super::features::aggregate_area;

/// Errors that can occur while evaluating an area.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("density estimation failed: {0}")]
    Density(#[from] DensityError),

    #[error("classifier input rejected: {0}")]
    Classify(#[from] ClassifyError),
}

/// Evaluate one area from its road and building tag samples.
///
/// Uses the density radius and occupancy from `config.density` and the
/// classifier thresholds from `config.thresholds`.
///
/// # Errors
///
/// Returns an error if the configured radius is not positive, or if the
/// aggregated statistics fall outside the classifier domain.
pub fn evaluate(
    roads: &[RoadTagSample],
    buildings: &[BuildingTagSample],
    config: &PlannerConfig,
) -> Result<Evaluation, PipelineError> {
    let features = aggregate_area(roads, buildings);
    debug!("Aggregated features: {:?}", features);

    let population_density = estimate_density(
        features.building_count,
        features.avg_floors,
        config.density.radius_m,
        config.density.occupants_per_floor,
    )?;

    validate_inputs(features.avg_speed, population_density, features.avg_floors)?;
    let radio = classify_with(
        features.avg_speed,
        population_density,
        features.avg_floors,
        &config.thresholds,
    );

    info!(
        "Density {:.1}/km² -> {} ({}, {}, {} CP)",
        population_density, radio.area_type, radio.frequency, radio.subcarrier, radio.cyclic_prefix
    );

    Ok(Evaluation {
        coordinate: None,
        radius_m: config.density.radius_m,
        features,
        population_density,
        config: radio,
    })
}

/// Evaluate one area from Overpass road and building responses.
///
/// A missing response is treated as an empty element list.
pub fn evaluate_responses(
    roads: Option<&OverpassResponse>,
    buildings: Option<&OverpassResponse>,
    coordinate: Option<Coordinate>,
    config: &PlannerConfig,
) -> Result<Evaluation, PipelineError> {
    let road_tags = roads.map(road_samples).unwrap_or_default();
    let building_tags = buildings.map(building_samples).unwrap_or_default();

    let mut evaluation = evaluate(&road_tags, &building_tags, config)?;
    evaluation.coordinate = coordinate;
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::parse_overpass_json;
    use crate::core::model::{AreaType, Frequency, Subcarrier};
    use std::collections::HashMap;

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_evaluate_empty_is_rural_default() {
        let evaluation = evaluate(&[], &[], &PlannerConfig::default()).unwrap();

        assert_eq!(evaluation.features.avg_speed, 50.0);
        assert_eq!(evaluation.features.avg_floors, 1.0);
        assert_eq!(evaluation.population_density, 0.0);
        assert_eq!(evaluation.config.area_type, AreaType::RuralMountain);
        assert_eq!(evaluation.config.subcarrier, Subcarrier::Khz30);
    }

    #[test]
    fn test_evaluate_dense_area() {
        // 3000 buildings * 5 floors * 30 people / 25π km² ≈ 5730 people/km²
        let roads = vec![tags(&[("maxspeed", "30")]); 10];
        let buildings = vec![tags(&[("building:levels", "5")]); 3000];

        let evaluation = evaluate(&roads, &buildings, &PlannerConfig::default()).unwrap();

        assert!(evaluation.population_density > 5000.0);
        assert_eq!(evaluation.config.area_type, AreaType::BigCapital);
        assert_eq!(evaluation.config.frequency, Frequency::Ghz3_0);
        assert_eq!(evaluation.config.subcarrier, Subcarrier::Khz15);
        assert_eq!(evaluation.features.road_count, 10);
    }

    #[test]
    fn test_evaluate_zero_level_buildings() {
        let buildings = vec![tags(&[("building", "yes"), ("building:levels", "0")]); 4000];

        let evaluation = evaluate(&[], &buildings, &PlannerConfig::default()).unwrap();

        assert_eq!(evaluation.features.building_count, 4000);
        assert_eq!(evaluation.features.avg_floors, 0.0);
        assert_eq!(evaluation.population_density, 0.0);
        assert_eq!(evaluation.config.area_type, AreaType::RuralMountain);
    }

    #[test]
    fn test_evaluate_rejects_bad_radius() {
        let mut config = PlannerConfig::default();
        config.density.radius_m = 0.0;

        let result = evaluate(&[], &[], &config);
        assert!(matches!(result, Err(PipelineError::Density(_))));
    }

    #[test]
    fn test_evaluate_responses() {
        let roads = parse_overpass_json(
            r#"{"elements": [
                {"type": "way", "id": 1, "tags": {"highway": "motorway", "maxspeed": "110"}},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 0.0}
            ]}"#,
        )
        .unwrap();
        let coordinate = Coordinate::new(45.0, 7.0).unwrap();

        let evaluation =
            evaluate_responses(Some(&roads), None, Some(coordinate), &PlannerConfig::default())
                .unwrap();

        assert_eq!(evaluation.features.road_count, 1);
        assert_eq!(evaluation.features.avg_speed, 110.0);
        assert_eq!(evaluation.features.building_count, 0);
        assert_eq!(evaluation.coordinate, Some(coordinate));
        assert_eq!(evaluation.config.subcarrier, Subcarrier::Khz120);
    }
}
