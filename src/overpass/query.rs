//! Overpass QL query builders.

use std::fmt;

use crate::core::model::Coordinate;

/// Server-side timeout written into every query, in seconds.
pub const QUERY_TIMEOUT_SECS: u64 = 25;

/// Which feature family a query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Ways tagged `highway`.
    Road,
    /// Ways and relations tagged `building`.
    Building,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Road => "road",
            QueryKind::Building => "building",
        }
    }

    /// Base name used for extracted files.
    pub fn file_stem(&self) -> &'static str {
        match self {
            QueryKind::Road => "road_network",
            QueryKind::Building => "buildings",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escape a value for use inside a double-quoted Overpass string.
fn escape_ql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn build_query(kind: QueryKind, header: &str, filter: &str) -> String {
    let selectors = match kind {
        QueryKind::Road => format!("  way[\"highway\"]{filter};\n"),
        QueryKind::Building => format!(
            "  way[\"building\"]{filter};\n  relation[\"building\"]{filter};\n"
        ),
    };

    format!(
        "[out:json][timeout:{QUERY_TIMEOUT_SECS}];\n{header}(\n{selectors});\nout body;\n>;\nout skel qt;\n"
    )
}

/// Query for features of `kind` inside the OSM area named `area_name`.
///
/// # Example
///
/// ```
/// use numerology_planner::overpass::{build_static_query, QueryKind};
///
/// let query = build_static_query("Paris", QueryKind::Road);
/// assert!(query.contains("area[\"name\"=\"Paris\"]->.searchArea;"));
/// assert!(query.contains("way[\"highway\"](area.searchArea);"));
/// ```
pub fn build_static_query(area_name: &str, kind: QueryKind) -> String {
    let header = format!("area[\"name\"=\"{}\"]->.searchArea;\n", escape_ql(area_name));
    build_query(kind, &header, "(area.searchArea)")
}

/// Query for features of `kind` within `radius_m` meters of `center`.
pub fn build_dynamic_query(center: Coordinate, radius_m: u32, kind: QueryKind) -> String {
    let filter = format!("(around:{},{},{})", radius_m, center.lat, center.lon);
    build_query(kind, "", &filter)
}
