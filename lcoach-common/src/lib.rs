//! # LCOACH Common Library
//!
//! Shared code for the LCOACH lecture-analysis services including:
//! - Error types
//! - Event types (`LcoachEvent` enum) and the `EventBus`
//! - TOML configuration loading

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
