//! Blocking Overpass API client.

use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;
use ureq::Agent;

use crate::config::QueryConfig;
use crate::core::loaders::OverpassResponse;
use crate::core::model::Coordinate;

use super::query::{build_dynamic_query, QueryKind};

/// Default cap on a response body, in bytes.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;

/// Errors that can occur while fetching from Overpass.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Overpass returned HTTP {status}")]
    Status { status: u16 },

    #[error("Overpass request failed: {0}")]
    Request(String),

    #[error("Overpass response exceeds the {limit} byte body limit")]
    TooLarge { limit: u64 },

    #[error("Overpass response is not valid JSON: {0}")]
    Decode(String),

    #[error("Overpass aborted the query: {0}")]
    Runtime(String),
}

impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(status) => FetchError::Status { status },
            ureq::Error::BodyExceedsLimit(limit) => FetchError::TooLarge { limit },
            ureq::Error::Json(e) => FetchError::Decode(e.to_string()),
            other => FetchError::Request(other.to_string()),
        }
    }
}

/// Decode a response body, rejecting results the server reports as truncated.
pub fn decode_response(body: &[u8]) -> Result<OverpassResponse, FetchError> {
    let response: OverpassResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    if let Some(remark) = response.runtime_error() {
        return Err(FetchError::Runtime(remark.to_string()));
    }
    Ok(response)
}

/// Anything that can answer an Overpass QL query.
pub trait OverpassSource {
    fn fetch(&self, query: &str) -> Result<OverpassResponse, FetchError>;
}

/// Overpass interpreter reached over HTTP.
pub struct OverpassClient {
    agent: Agent,
    url: String,
    max_body_bytes: u64,
}

impl OverpassClient {
    pub fn new(url: &str, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .user_agent(concat!("numerology-planner/", env!("CARGO_PKG_VERSION")))
            .build()
            .into();

        Self {
            agent,
            url: url.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Set the largest response body accepted, in bytes.
    pub fn with_body_limit(mut self, max_body_bytes: u64) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn from_config(config: &QueryConfig) -> Self {
        Self::new(&config.overpass_url, Duration::from_secs(config.timeout_secs))
            .with_body_limit(config.max_body_bytes)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl OverpassSource for OverpassClient {
    /// Send `query` as the `data` parameter of a GET request.
    fn fetch(&self, query: &str) -> Result<OverpassResponse, FetchError> {
        debug!("GET {} ({} byte query)", self.url, query.len());
        let mut response = self.agent.get(&self.url).query("data", query).call()?;
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_vec()?;
        debug!("Overpass returned {} bytes", body.len());

        let decoded = decode_response(&body)?;
        debug!("Decoded {} elements", decoded.len());
        Ok(decoded)
    }
}

/// Road and building results for one query circle.
///
/// The two fetches are independent, so one can fail while the other
/// succeeds.
#[derive(Debug)]
pub struct AreaResponses {
    pub roads: Result<OverpassResponse, FetchError>,
    pub buildings: Result<OverpassResponse, FetchError>,
}

impl AreaResponses {
    /// Keep whichever lists were fetched, logging a warning for each failure.
    pub fn into_available(self) -> (Option<OverpassResponse>, Option<OverpassResponse>) {
        (
            available(QueryKind::Road, self.roads),
            available(QueryKind::Building, self.buildings),
        )
    }
}

fn available(
    kind: QueryKind,
    result: Result<OverpassResponse, FetchError>,
) -> Option<OverpassResponse> {
    match result {
        Ok(response) => Some(response),
        Err(e) => {
            warn!("No {} data available ({}), using defaults", kind, e);
            None
        }
    }
}

/// Fetch roads and buildings within `radius_m` of `center`.
pub fn fetch_around<S: OverpassSource + ?Sized>(
    source: &S,
    center: Coordinate,
    radius_m: u32,
) -> AreaResponses {
    info!("Fetching roads and buildings within {} m of {}", radius_m, center);
    let roads = source.fetch(&build_dynamic_query(center, radius_m, QueryKind::Road));
    let buildings = source.fetch(&build_dynamic_query(center, radius_m, QueryKind::Building));
    AreaResponses { roads, buildings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::core::loaders::parse_overpass_json;
    use crate::processors::pipeline::evaluate_responses;
    use std::cell::RefCell;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Answers from canned JSON and records each query it receives.
    struct CannedSource {
        road_json: &'static str,
        building_json: &'static str,
        queries: RefCell<Vec<String>>,
    }

    impl OverpassSource for CannedSource {
        fn fetch(&self, query: &str) -> Result<OverpassResponse, FetchError> {
            self.queries.borrow_mut().push(query.to_string());
            let json = if query.contains("highway") {
                self.road_json
            } else {
                self.building_json
            };
            parse_overpass_json(json).map_err(|e| FetchError::Decode(e.to_string()))
        }
    }

    struct FailingSource;

    impl OverpassSource for FailingSource {
        fn fetch(&self, _query: &str) -> Result<OverpassResponse, FetchError> {
            Err(FetchError::Status { status: 429 })
        }
    }

    /// Serves roads and times out on buildings, as a busy server does.
    struct BuildingTimeoutSource;

    impl OverpassSource for BuildingTimeoutSource {
        fn fetch(&self, query: &str) -> Result<OverpassResponse, FetchError> {
            if query.contains("highway") {
                parse_overpass_json(
                    r#"{"elements": [{"type": "way", "id": 1,
                        "tags": {"highway": "motorway", "maxspeed": "110"}}]}"#,
                )
                .map_err(|e| FetchError::Decode(e.to_string()))
            } else {
                Err(FetchError::Status { status: 504 })
            }
        }
    }

    /// Answer one HTTP request on a local port with `body`, returning the URL.
    fn serve_once(body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            loop {
                line.clear();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }

            let mut stream = reader.into_inner();
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(header.as_bytes()).unwrap();
            // The client may hang up early once its body limit is hit
            let _ = stream.write_all(&body);
        });

        format!("http://{}/api/interpreter", addr)
    }

    /// Body of `count` node elements.
    fn nodes_body(count: usize) -> Vec<u8> {
        let mut body = String::from(r#"{"version": 0.6, "elements": ["#);
        for id in 0..count {
            if id > 0 {
                body.push(',');
            }
            body.push_str(&format!(
                r#"{{"type": "node", "id": {}, "lat": 48.8566, "lon": 2.3522}}"#,
                id
            ));
        }
        body.push_str("]}");
        body.into_bytes()
    }

    #[test]
    fn test_fetch_around_issues_both_queries() {
        let source = CannedSource {
            road_json: r#"{"elements": [{"type": "way", "id": 1, "tags": {"highway": "primary"}}]}"#,
            building_json: r#"{"elements": []}"#,
            queries: RefCell::new(Vec::new()),
        };
        let center = Coordinate::new(1.0, 2.0).unwrap();

        let responses = fetch_around(&source, center, 5000);

        assert_eq!(responses.roads.unwrap().len(), 1);
        assert!(responses.buildings.unwrap().is_empty());
        let queries = source.queries.borrow();
        assert_eq!(queries.len(), 2);
        assert!(queries[0].contains("around:5000,1,2"));
        assert!(queries[1].contains("relation[\"building\"]"));
    }

    #[test]
    fn test_fetch_around_reports_both_failures() {
        let center = Coordinate::new(1.0, 2.0).unwrap();
        let responses = fetch_around(&FailingSource, center, 5000);
        assert!(matches!(responses.roads, Err(FetchError::Status { status: 429 })));
        assert!(matches!(responses.buildings, Err(FetchError::Status { status: 429 })));

        let (roads, buildings) = responses.into_available();
        assert!(roads.is_none());
        assert!(buildings.is_none());
    }

    #[test]
    fn test_building_failure_keeps_road_data() {
        let center = Coordinate::new(52.5, 13.4).unwrap();
        let (roads, buildings) = fetch_around(&BuildingTimeoutSource, center, 5000).into_available();

        assert_eq!(roads.as_ref().map(OverpassResponse::len), Some(1));
        assert!(buildings.is_none());

        let evaluation = evaluate_responses(
            roads.as_ref(),
            buildings.as_ref(),
            Some(center),
            &PlannerConfig::default(),
        )
        .unwrap();
        assert_eq!(evaluation.features.avg_speed, 110.0);
        assert_eq!(evaluation.features.building_count, 0);
    }

    #[test]
    fn test_decode_rejects_runtime_error_remark() {
        let body = br#"{"remark": "runtime error: Query run out of memory using about 2048 MB of RAM.",
                        "elements": [{"type": "node", "id": 1, "lat": 0.0, "lon": 0.0}]}"#;
        let result = decode_response(body);
        assert!(matches!(result, Err(FetchError::Runtime(ref r)) if r.contains("out of memory")));
    }

    #[test]
    fn test_decode_accepts_complete_response() {
        let response = decode_response(br#"{"elements": []}"#).unwrap();
        assert!(response.is_empty());
        assert!(matches!(decode_response(b"<html>"), Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_fetch_reads_body_larger_than_ten_mib() {
        let count = 250_000;
        let body = nodes_body(count);
        assert!(body.len() > 10 * 1024 * 1024);

        let url = serve_once(body);
        let client = OverpassClient::new(&url, Duration::from_secs(30));
        let response = client.fetch("[out:json];node(1);out;").unwrap();

        assert_eq!(response.len(), count);
    }

    #[test]
    fn test_fetch_enforces_configured_body_limit() {
        let url = serve_once(nodes_body(1_000));
        let client = OverpassClient::new(&url, Duration::from_secs(30)).with_body_limit(1024);

        let result = client.fetch("[out:json];node(1);out;");

        assert!(matches!(result, Err(FetchError::TooLarge { limit: 1024 })));
    }

    #[test]
    fn test_fetch_surfaces_server_runtime_error() {
        let body = br#"{"remark": "runtime error: Query timed out in \"query\" at line 3 after 26 seconds.",
                        "elements": []}"#
            .to_vec();
        let url = serve_once(body);
        let client = OverpassClient::new(&url, Duration::from_secs(30));

        let result = client.fetch("[out:json];node(1);out;");

        assert!(matches!(result, Err(FetchError::Runtime(ref r)) if r.contains("timed out")));
    }

    #[test]
    fn test_client_from_config() {
        let mut config = QueryConfig::default();
        let client = OverpassClient::from_config(&config);
        assert_eq!(client.url(), "http://overpass-api.de/api/interpreter");
        assert_eq!(client.max_body_bytes, DEFAULT_MAX_BODY_BYTES);

        config.max_body_bytes = 4096;
        assert_eq!(OverpassClient::from_config(&config).max_body_bytes, 4096);
    }
}
