//! Data loaders for Overpass JSON responses and scenario CSV files.
//!
//! This module provides parsers for:
//! - Overpass API JSON (`[out:json]`) responses, either fetched or saved to disk
//! - Scenario CSV files holding pre-computed classification inputs
//!
//! It also splits a response into the road and building tag samples the
//! feature aggregator consumes.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::model::{BuildingTagSample, RoadTagSample};

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// OSM element kind as reported by Overpass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

/// Member reference of an OSM relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationMember {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(rename = "ref")]
    pub reference: i64,
    #[serde(default)]
    pub role: String,
}

/// One element of an Overpass response.
///
/// Nodes carry `lat`/`lon`, ways carry `nodes`, relations carry `members`.
/// Skeleton nodes returned by `out skel` have no tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsmElement {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<RelationMember>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    /// Fields not modelled above (`center`, `bounds`, `timestamp`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OsmElement {
    /// Returns true if the element carries `key` as a tag.
    #[inline]
    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }
}

/// Overpass `[out:json]` response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverpassResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    /// Server remark; Overpass reports timeouts and memory exhaustion here
    /// while still answering HTTP 200 with a truncated element list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(default)]
    pub elements: Vec<OsmElement>,
    /// Top-level fields not modelled above (`osm3s`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OverpassResponse {
    /// Returns the number of elements in the response.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the response holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The remark if it reports a server-side runtime error.
    ///
    /// Such a response is incomplete and must not be treated as the full
    /// element list.
    pub fn runtime_error(&self) -> Option<&str> {
        self.remark
            .as_deref()
            .filter(|r| r.trim_start().starts_with("runtime error"))
    }

    /// Indexes node coordinates by id as `[lon, lat]`.
    pub fn node_positions(&self) -> HashMap<i64, [f64; 2]> {
        self.elements
            .iter()
            .filter(|e| e.kind == ElementKind::Node)
            .filter_map(|e| Some((e.id, [e.lon?, e.lat?])))
            .collect()
    }
}

/// Parse an Overpass JSON document from a string.
pub fn parse_overpass_json(content: &str) -> Result<OverpassResponse> {
    Ok(serde_json::from_str(content)?)
}

/// Load an Overpass JSON response saved to disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not an Overpass
/// JSON document.
pub fn load_overpass_json<P: AsRef<Path>>(path: P) -> Result<OverpassResponse> {
    let file = File::open(path.as_ref())?;
    let response = serde_json::from_reader(BufReader::new(file))?;
    Ok(response)
}

/// Tag maps of all elements tagged `highway`.
pub fn road_samples(response: &OverpassResponse) -> Vec<RoadTagSample> {
    tagged_samples(response, "highway")
}

/// Tag maps of all elements tagged `building`.
pub fn building_samples(response: &OverpassResponse) -> Vec<BuildingTagSample> {
    tagged_samples(response, "building")
}

fn tagged_samples(response: &OverpassResponse, key: &str) -> Vec<HashMap<String, String>> {
    response
        .elements
        .iter()
        .filter(|e| e.has_tag(key))
        .map(|e| e.tags.clone())
        .collect()
}

/// One row of classifier inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub avg_speed: f64,
    pub population_density: f64,
    pub avg_floors: f64,
}

/// Load classifier inputs from a CSV file.
///
/// The CSV must have a header row with the columns `avg_speed`,
/// `population_density` and `avg_floors` in any order.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a row does not parse,
/// or the file holds no rows.
pub fn load_scenarios_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Scenario>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let mut scenarios = Vec::new();
    for result in reader.deserialize() {
        let scenario: Scenario = result?;
        scenarios.push(scenario);
    }

    if scenarios.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(scenarios)
}
