//! Overpass API access: query building and HTTP fetch.

pub mod client;
pub mod query;

pub use client::{
    decode_response, fetch_around, AreaResponses, FetchError, OverpassClient, OverpassSource,
};
pub use query::{build_dynamic_query, build_static_query, QueryKind};
