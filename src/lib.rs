#![deny(
    rust_2018_compatibility,
    rust_2018_idioms,
    nonstandard_style,
    unused,
    future_incompatible,
    non_camel_case_types,
    unused_parens,
    non_upper_case_globals,
    unused_qualifications,
    unused_results,
    unused_imports,
    unused_variables,
    bare_trait_objects,
    ellipsis_inclusive_range_patterns,
    elided_lifetimes_in_paths
)]
#![warn(clippy::explicit_into_iter_loop)]

pub mod config;
pub mod field;
pub mod generator;
pub mod geom;
pub mod layers;
pub mod partition;
pub mod path;
pub mod points;
pub mod relax;
pub mod sample;
pub mod voronoi;

pub mod prelude {
    pub use crate::config::{PrepareSupportConfig, SampleConfig};
    pub use crate::generator::SupportGenerator;
    pub use crate::geom::{ExPolygon, Point, Polygon};
    pub use crate::layers::Layer;
    pub use crate::points::{SupportKind, SupportPoint};
    pub use crate::SlaError;
}

/// Errors produced while building support points for an island stack.
///
/// Degenerate-geometry situations that the algorithm is expected to work
/// around (bad Voronoi diagrams, config values out of range) are repaired
/// in place and never surface here -- see `config::SampleConfig::verify`
/// and `voronoi::VoronoiGraph::build`'s `BadShape` fallback. Only failures
/// that abort a whole generation run reach `SlaError`.
#[derive(thiserror::Error, Debug)]
pub enum SlaError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid input data: {0}")]
    InvalidInputData(String),

    #[error("missing input data: {0}")]
    NoData(String),

    #[error("internal error while placing supports (try rotating the model slightly): {0}")]
    Internal(String),

    #[error("support generation was cancelled")]
    Cancelled,
}
