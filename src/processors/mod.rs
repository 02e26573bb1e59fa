//! Data processing modules.

pub mod classifier;
pub mod density;
pub mod extract;
pub mod features;
pub mod pipeline;

// Re-export key types for convenience
pub use classifier::{classify, classify_with, validate_inputs, ClassifyError};
pub use density::{estimate_density, DensityError};
pub use extract::{convert_file, extract_area, ExtractTarget, ExtractedFile};
pub use features::{aggregate_area, aggregate_building_features, aggregate_road_features};
pub use pipeline::{evaluate, evaluate_responses, PipelineError};
