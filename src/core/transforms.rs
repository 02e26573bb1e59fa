//! Overpass to GeoJSON conversion.
//!
//! Converts the elements of an Overpass `out body; >; out skel qt;`
//! response into a GeoJSON `FeatureCollection`. Way geometry is rebuilt
//! from the skeleton nodes that follow the tagged elements in the same
//! response, and relation geometry from the member ways. Coordinates are
//! emitted as `[lon, lat]`.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use super::loaders::{ElementKind, OsmElement, OverpassResponse};

/// Result of converting a response to GeoJSON.
#[derive(Debug, Clone)]
pub struct GeoJsonConversion {
    /// The `FeatureCollection` document.
    pub collection: Value,
    /// Number of features emitted.
    pub features: usize,
    /// Tagged elements that could not be given a geometry.
    pub skipped: usize,
}

/// Returns true if a closed way should be emitted as an area.
fn is_area(element: &OsmElement) -> bool {
    if element.tags.get("area").map(String::as_str) == Some("no") {
        return false;
    }
    element.has_tag("building") || element.tags.get("area").map(String::as_str) == Some("yes")
}

/// Node positions and way node lists of one response.
pub struct GeometryIndex<'a> {
    positions: HashMap<i64, [f64; 2]>,
    ways: HashMap<i64, &'a [i64]>,
}

impl<'a> GeometryIndex<'a> {
    pub fn new(response: &'a OverpassResponse) -> Self {
        let ways = response
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::Way)
            .map(|e| (e.id, e.nodes.as_slice()))
            .collect();

        Self {
            positions: response.node_positions(),
            ways,
        }
    }

    /// Resolve node refs to coordinates. Returns `None` if any ref is missing.
    fn resolve(&self, nodes: &[i64]) -> Option<Vec<[f64; 2]>> {
        nodes.iter().map(|id| self.positions.get(id).copied()).collect()
    }
}

/// Join way segments into closed rings of node ids.
///
/// Segments are chained end to start, reversed where needed. Returns `None`
/// if a chain cannot be closed.
fn assemble_rings(segments: Vec<&[i64]>) -> Option<Vec<Vec<i64>>> {
    let mut pending: Vec<Vec<i64>> = segments
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(<[i64]>::to_vec)
        .collect();
    let mut rings = Vec::new();

    while let Some(mut ring) = pending.pop() {
        while ring.first() != ring.last() {
            let end = *ring.last()?;
            let next = pending
                .iter()
                .position(|s| s.first() == Some(&end) || s.last() == Some(&end))?;
            let mut segment = pending.swap_remove(next);
            if segment.first() != Some(&end) {
                segment.reverse();
            }
            ring.extend_from_slice(&segment[1..]);
        }
        if ring.len() < 4 {
            return None;
        }
        rings.push(ring);
    }

    Some(rings)
}

fn resolve_rings(segments: Vec<&[i64]>, index: &GeometryIndex) -> Option<Vec<Vec<[f64; 2]>>> {
    assemble_rings(segments)?
        .iter()
        .map(|ring| index.resolve(ring))
        .collect()
}

/// Even-odd test of `point` against a closed ring.
fn ring_contains(ring: &[[f64; 2]], point: [f64; 2]) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let ([xi, yi], [xj, yj]) = (ring[i], ring[j]);
        if (yi > point[1]) != (yj > point[1])
            && point[0] < (xj - xi) * (point[1] - yi) / (yj - yi) + xi
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// `MultiPolygon` of a multipolygon or building relation.
///
/// Member ways with role `outer`, `outline` or no role form the outer rings;
/// `inner` ways become holes of the outer ring that contains them.
fn relation_geometry(element: &OsmElement, index: &GeometryIndex) -> Option<Value> {
    let mut outer: Vec<&[i64]> = Vec::new();
    let mut inner: Vec<&[i64]> = Vec::new();

    for member in element.members.iter().filter(|m| m.kind == ElementKind::Way) {
        let target = match member.role.as_str() {
            "outer" | "outline" | "" => &mut outer,
            "inner" => &mut inner,
            _ => continue,
        };
        target.push(*index.ways.get(&member.reference)?);
    }

    let mut polygons: Vec<Vec<Vec<[f64; 2]>>> = resolve_rings(outer, index)?
        .into_iter()
        .map(|ring| vec![ring])
        .collect();
    if polygons.is_empty() {
        return None;
    }

    for hole in resolve_rings(inner, index)? {
        let owner = polygons
            .iter()
            .position(|polygon| ring_contains(&polygon[0], hole[0]))
            .unwrap_or(0);
        polygons[owner].push(hole);
    }

    Some(json!({ "type": "MultiPolygon", "coordinates": polygons }))
}

/// Build the geometry object for a single element.
///
/// Nodes become `Point`s. Ways become `Polygon`s when closed and tagged as an
/// area, otherwise `LineString`s. Relations become `MultiPolygon`s assembled
/// from their member ways.
pub fn element_geometry(element: &OsmElement, index: &GeometryIndex) -> Option<Value> {
    match element.kind {
        ElementKind::Node => {
            let (lat, lon) = (element.lat?, element.lon?);
            Some(json!({ "type": "Point", "coordinates": [lon, lat] }))
        }
        ElementKind::Way => {
            let coords = index.resolve(&element.nodes)?;
            if coords.len() < 2 {
                return None;
            }
            let closed = coords.len() >= 4 && element.nodes.first() == element.nodes.last();
            if closed && is_area(element) {
                Some(json!({ "type": "Polygon", "coordinates": [coords] }))
            } else {
                Some(json!({ "type": "LineString", "coordinates": coords }))
            }
        }
        ElementKind::Relation => relation_geometry(element, index),
    }
}

fn feature(element: &OsmElement, geometry: Value) -> Value {
    let tags: Map<String, Value> = element
        .tags
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    json!({
        "type": "Feature",
        "properties": {
            "type": element.kind.as_str(),
            "id": element.id,
            "tags": tags,
        },
        "geometry": geometry,
    })
}

/// Convert an Overpass response to a GeoJSON `FeatureCollection`.
///
/// Only tagged elements become features; untagged skeleton nodes are used
/// for way geometry and are not emitted on their own.
///
/// # Example
///
/// ```
/// use numerology_planner::core::loaders::parse_overpass_json;
/// use numerology_planner::core::transforms::to_geojson;
///
/// let response = parse_overpass_json(r#"{"elements": [
///     {"type": "node", "id": 1, "lat": 1.0, "lon": 2.0, "tags": {"amenity": "cafe"}}
/// ]}"#).unwrap();
/// let conversion = to_geojson(&response);
/// assert_eq!(conversion.features, 1);
/// ```
pub fn to_geojson(response: &OverpassResponse) -> GeoJsonConversion {
    let index = GeometryIndex::new(response);
    let mut features = Vec::with_capacity(response.len());
    let mut skipped = 0;

    for element in response.elements.iter().filter(|e| !e.tags.is_empty()) {
        match element_geometry(element, &index) {
            Some(geometry) => features.push(feature(element, geometry)),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::debug!("GeoJSON conversion skipped {} elements without geometry", skipped);
    }

    let count = features.len();
    GeoJsonConversion {
        collection: json!({ "type": "FeatureCollection", "features": features }),
        features: count,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::parse_overpass_json;

    fn sample() -> OverpassResponse {
        parse_overpass_json(
            r#"{"elements": [
                {"type": "way", "id": 10, "nodes": [1, 2, 3], "tags": {"highway": "residential"}},
                {"type": "way", "id": 11, "nodes": [1, 2, 3, 1], "tags": {"building": "yes"}},
                {"type": "way", "id": 12, "nodes": [1, 99], "tags": {"highway": "service"}},
                {"type": "relation", "id": 13, "members": [], "tags": {"building": "yes"}},
                {"type": "node", "id": 1, "lat": 10.0, "lon": 20.0},
                {"type": "node", "id": 2, "lat": 10.5, "lon": 20.5},
                {"type": "node", "id": 3, "lat": 11.0, "lon": 20.0}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_to_geojson_counts() {
        let conversion = to_geojson(&sample());
        assert_eq!(conversion.features, 2);
        assert_eq!(conversion.skipped, 2);
        assert_eq!(conversion.collection["type"], "FeatureCollection");
    }

    #[test]
    fn test_road_becomes_linestring() {
        let conversion = to_geojson(&sample());
        let road = &conversion.collection["features"][0];
        assert_eq!(road["geometry"]["type"], "LineString");
        assert_eq!(road["geometry"]["coordinates"][0], json!([20.0, 10.0]));
        assert_eq!(road["properties"]["id"], 10);
        assert_eq!(road["properties"]["tags"]["highway"], "residential");
    }

    #[test]
    fn test_closed_building_becomes_polygon() {
        let conversion = to_geojson(&sample());
        let building = &conversion.collection["features"][1];
        assert_eq!(building["geometry"]["type"], "Polygon");
        assert_eq!(
            building["geometry"]["coordinates"][0]
                .as_array()
                .map(Vec::len),
            Some(4)
        );
    }

    #[test]
    fn test_closed_highway_stays_linestring() {
        let response = parse_overpass_json(
            r#"{"elements": [
                {"type": "way", "id": 5, "nodes": [1, 2, 3, 1], "tags": {"highway": "service"}},
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0},
                {"type": "node", "id": 3, "lat": 1.0, "lon": 1.0}
            ]}"#,
        )
        .unwrap();

        let conversion = to_geojson(&response);
        assert_eq!(
            conversion.collection["features"][0]["geometry"]["type"],
            "LineString"
        );
    }

    #[test]
    fn test_tagged_node_becomes_point() {
        let response = parse_overpass_json(
            r#"{"elements": [{"type": "node", "id": 7, "lat": 1.5, "lon": 2.5, "tags": {"name": "x"}}]}"#,
        )
        .unwrap();

        let conversion = to_geojson(&response);
        let point = &conversion.collection["features"][0]["geometry"];
        assert_eq!(point["type"], "Point");
        assert_eq!(point["coordinates"], json!([2.5, 1.5]));
    }

    /// Square building relation split over two outer ways, with a
    /// triangular courtyard.
    const COURTYARD: &str = r#"{"elements": [
        {"type": "relation", "id": 100,
         "members": [
            {"type": "way", "ref": 20, "role": "outer"},
            {"type": "way", "ref": 21, "role": "outer"},
            {"type": "way", "ref": 22, "role": "inner"}
         ],
         "tags": {"type": "multipolygon", "building": "yes"}},
        {"type": "way", "id": 20, "nodes": [1, 2, 3]},
        {"type": "way", "id": 21, "nodes": [1, 4, 3]},
        {"type": "way", "id": 22, "nodes": [5, 6, 7, 5]},
        {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
        {"type": "node", "id": 2, "lat": 0.0, "lon": 10.0},
        {"type": "node", "id": 3, "lat": 10.0, "lon": 10.0},
        {"type": "node", "id": 4, "lat": 10.0, "lon": 0.0},
        {"type": "node", "id": 5, "lat": 2.0, "lon": 2.0},
        {"type": "node", "id": 6, "lat": 2.0, "lon": 4.0},
        {"type": "node", "id": 7, "lat": 4.0, "lon": 4.0}
    ]}"#;

    #[test]
    fn test_building_relation_becomes_multipolygon() {
        let response = parse_overpass_json(COURTYARD).unwrap();

        let conversion = to_geojson(&response);

        assert_eq!(conversion.features, 1);
        assert_eq!(conversion.skipped, 0);
        let feature = &conversion.collection["features"][0];
        assert_eq!(feature["properties"]["type"], "relation");
        assert_eq!(feature["properties"]["id"], 100);
        assert_eq!(feature["geometry"]["type"], "MultiPolygon");

        let polygons = feature["geometry"]["coordinates"].as_array().unwrap();
        assert_eq!(polygons.len(), 1);
        let outer = polygons[0][0].as_array().unwrap();
        assert_eq!(outer.len(), 5);
        assert_eq!(outer.first(), outer.last());
        assert_eq!(polygons[0][1].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn test_unclosed_relation_is_skipped() {
        let response = parse_overpass_json(
            r#"{"elements": [
                {"type": "relation", "id": 100,
                 "members": [{"type": "way", "ref": 20, "role": "outer"}],
                 "tags": {"building": "yes"}},
                {"type": "way", "id": 20, "nodes": [1, 2, 3]},
                {"type": "node", "id": 1, "lat": 0.0, "lon": 0.0},
                {"type": "node", "id": 2, "lat": 0.0, "lon": 1.0},
                {"type": "node", "id": 3, "lat": 1.0, "lon": 1.0}
            ]}"#,
        )
        .unwrap();

        let conversion = to_geojson(&response);
        assert_eq!(conversion.features, 0);
        assert_eq!(conversion.skipped, 1);
    }

    #[test]
    fn test_ring_contains() {
        let square = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]];
        assert!(ring_contains(&square, [5.0, 5.0]));
        assert!(!ring_contains(&square, [15.0, 5.0]));
    }

    #[test]
    fn test_empty_response() {
        let conversion = to_geojson(&OverpassResponse::default());
        assert_eq!(conversion.features, 0);
        assert_eq!(conversion.collection["features"], json!([]));
    }
}
