//! Core data types and I/O operations.

pub mod loaders;
pub mod model;
pub mod transforms;
pub mod writers;

pub use loaders::{OsmElement, OverpassResponse, Scenario};
pub use model::{
    AreaFeatureSet, AreaType, Coordinate, CyclicPrefix, Evaluation, Frequency, RadioConfig,
    Subcarrier,
};
pub use writers::{write_configs_csv, write_evaluation_json, write_json, WriteError};
