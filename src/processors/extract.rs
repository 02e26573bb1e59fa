//! Map extraction: fetch Overpass data, save it and convert it to GeoJSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::core::loaders::load_overpass_json;
use crate::core::model::Coordinate;
use crate::core::transforms::to_geojson;
use crate::core::writers::write_json;
use crate::overpass::{build_dynamic_query, build_static_query, OverpassSource, QueryKind};

/// Where extracted data comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractTarget {
    /// An OSM area looked up by name.
    Named(String),
    /// A circle around a coordinate.
    Around { center: Coordinate, radius_m: u32 },
}

impl ExtractTarget {
    pub fn query(&self, kind: QueryKind) -> String {
        match self {
            ExtractTarget::Named(name) => build_static_query(name, kind),
            ExtractTarget::Around { center, radius_m } => {
                build_dynamic_query(*center, *radius_m, kind)
            }
        }
    }

    /// File name suffix: empty for named areas, `_{lat}_{lon}` for circles.
    pub fn file_suffix(&self) -> String {
        match self {
            ExtractTarget::Named(_) => String::new(),
            ExtractTarget::Around { center, .. } => format!("_{}", center),
        }
    }
}

/// Files written for one query kind.
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    pub kind: QueryKind,
    pub json_path: PathBuf,
    pub geojson_path: PathBuf,
    pub elements: usize,
    pub features: usize,
}

/// Convert a saved Overpass JSON file to GeoJSON.
///
/// Returns the number of features written.
pub fn convert_file(input: &Path, output: &Path) -> Result<usize> {
    let response = load_overpass_json(input)
        .with_context(|| format!("Failed to load Overpass JSON: {}", input.display()))?;
    let conversion = to_geojson(&response);
    write_json(output, &conversion.collection)?;
    info!(
        "Converted {} -> {} ({} features, {} skipped)",
        input.display(),
        output.display(),
        conversion.features,
        conversion.skipped
    );
    Ok(conversion.features)
}

/// Fetch roads and buildings for `target`, saving raw JSON and GeoJSON under
/// `output_dir`.
///
/// Files are named `road_network{suffix}.json`, `road_network{suffix}.geojson`,
/// `buildings{suffix}.json` and `buildings{suffix}.geojson`.
pub fn extract_area<S: OverpassSource + ?Sized>(
    source: &S,
    target: &ExtractTarget,
    output_dir: &Path,
) -> Result<Vec<ExtractedFile>> {
    let suffix = target.file_suffix();
    let mut files = Vec::with_capacity(2);

    for kind in [QueryKind::Road, QueryKind::Building] {
        let stem = format!("{}{}", kind.file_stem(), suffix);
        let json_path = output_dir.join(format!("{}.json", stem));
        let geojson_path = output_dir.join(format!("{}.geojson", stem));

        info!("Fetching {} data and saving to {}", kind, json_path.display());
        let response = source
            .fetch(&target.query(kind))
            .with_context(|| format!("Failed to fetch {} data", kind))?;
        write_json(&json_path, &response)?;

        let features = convert_file(&json_path, &geojson_path)?;

        files.push(ExtractedFile {
            kind,
            json_path,
            geojson_path,
            elements: response.len(),
            features,
        });
    }

    Ok(files)
}
