//! Rubric scoring
//!
//! Layered like the analysis itself:
//! - `binning` assigns raw metric values to labeled bins
//! - `continuous` replaces hard bin lookups with a sigmoid-weighted blend
//! - `dimensions` turns evidence into per-dimension point adjustments
//! - `confidence` measures how much evidence backed each score
//! - `engine` assembles the full `RubricResult`

pub mod binning;
pub mod confidence;
pub mod continuous;
pub mod dimensions;
pub mod engine;

pub use binning::{MetricBin, MetricBinTable};
pub use confidence::ConfidenceAggregator;
pub use continuous::ContinuousMapper;
pub use engine::RubricEngine;
