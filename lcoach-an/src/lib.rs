//! lcoach-an library interface
//!
//! Exposes the rubric engine, analysis pipeline, growth analysis and
//! result store for integration testing and for the CLI binary.

pub mod config;
pub mod db;
pub mod error;
pub mod growth;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod types;

pub use crate::error::{AnalysisError, AnalysisResult};
