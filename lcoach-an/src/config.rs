//! Rubric configuration
//!
//! The built-in defaults fully describe the "default" preset. A TOML
//! file may override any part of it; a missing or malformed file falls
//! back to the defaults with a warning rather than aborting a run.

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::DimensionId;
use crate::scoring::binning::MetricBinTable;
use crate::scoring::continuous::DEFAULT_STEEPNESS;
use crate::types::SourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the sigmoid steepness
pub const STEEPNESS_ENV_VAR: &str = "LCOACH_SIGMOID_STEEPNESS";

/// Environment variable naming the data root
pub const DATA_ROOT_ENV_VAR: &str = "LCOACH_DATA_ROOT";

/// Database location when none is given on the command line
///
/// Resolves the data root (CLI > env > config file > OS default) and
/// places `lcoach.db` under it.
pub fn default_db_path(cli_root: Option<&str>) -> AnalysisResult<PathBuf> {
    let root = lcoach_common::config::resolve_data_root(cli_root, DATA_ROOT_ENV_VAR)?;
    Ok(root.join("lcoach.db"))
}

/// Rubric config file to load when none is given on the command line
pub fn discover_config_file() -> Option<PathBuf> {
    lcoach_common::config::find_config_file().ok()
}

/// Per-source weights for overall confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceWeights {
    pub vision: f64,
    pub stt: f64,
    pub content: f64,
    pub vibe: f64,
    pub discourse: f64,
}

impl ConfidenceWeights {
    pub fn weight(&self, kind: SourceKind) -> f64 {
        match kind {
            SourceKind::Vision => self.vision,
            SourceKind::Stt => self.stt,
            SourceKind::Content => self.content,
            SourceKind::Vibe => self.vibe,
            SourceKind::Discourse => self.discourse,
        }
    }

    pub fn total(&self) -> f64 {
        self.vision + self.stt + self.content + self.vibe + self.discourse
    }
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            vision: 0.25,
            stt: 0.30,
            content: 0.15,
            vibe: 0.15,
            discourse: 0.15,
        }
    }
}

/// Starting point and adjustment room for one dimension
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DimensionPreset {
    /// Score assigned when no evidence moves the dimension
    pub base: f64,
    /// Maximum points evidence may add or subtract
    pub adjust_range: f64,
}

/// Full rubric configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RubricConfig {
    pub preset: String,
    /// Sigmoid blending on by default; off reverts to hard bin lookup
    pub continuous_scoring: bool,
    pub sigmoid_steepness: f64,
    pub confidence_weights: ConfidenceWeights,
    /// Keyed by `DimensionId::key()`
    pub dimensions: BTreeMap<String, DimensionPreset>,
    /// Bin tables keyed by metric name
    pub binning: BTreeMap<String, MetricBinTable>,
    /// Per-bin score deltas, keyed by metric name then bin label
    pub bin_scores: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Default for RubricConfig {
    fn default() -> Self {
        let mut dimensions = BTreeMap::new();
        for (dim, base, adjust_range) in [
            (DimensionId::Expertise, 14.0, 5.0),
            (DimensionId::TeachingMethod, 14.0, 5.0),
            (DimensionId::BoardLanguage, 10.0, 4.0),
            (DimensionId::Attitude, 10.0, 4.0),
            (DimensionId::Participation, 10.0, 4.5),
            (DimensionId::TimeAllocation, 7.0, 2.5),
            (DimensionId::Creativity, 3.0, 1.8),
        ] {
            dimensions.insert(dim.key().to_string(), DimensionPreset { base, adjust_range });
        }

        let mut binning = BTreeMap::new();
        binning.insert(
            "gesture_active_ratio".to_string(),
            MetricBinTable::from_edges(&[
                ("INACTIVE", 0.0, 0.15),
                ("LOW", 0.15, 0.35),
                ("MODERATE", 0.35, 0.55),
                ("ACTIVE", 0.55, 1.0),
            ]),
        );
        binning.insert(
            "eye_contact_ratio".to_string(),
            MetricBinTable::from_edges(&[
                ("AVOIDANT", 0.0, 0.15),
                ("LOW", 0.15, 0.35),
                ("MODERATE", 0.35, 0.6),
                ("ENGAGED", 0.6, 1.0),
            ]),
        );
        binning.insert(
            "filler_ratio".to_string(),
            MetricBinTable::from_edges(&[
                ("CLEAN", 0.0, 0.015),
                ("LOW", 0.015, 0.03),
                ("MODERATE", 0.03, 0.05),
                ("HEAVY", 0.05, 1.0),
            ]),
        );
        binning.insert(
            "monotone_ratio".to_string(),
            MetricBinTable::from_edges(&[
                ("VARIED", 0.0, 0.2),
                ("MILD", 0.2, 0.4),
                ("FLAT", 0.4, 0.6),
                ("MONOTONE", 0.6, 1.0),
            ]),
        );
        binning.insert(
            "teacher_ratio".to_string(),
            MetricBinTable::from_edges(&[
                ("BALANCED", 0.0, 0.7),
                ("TEACHER_LED", 0.7, 0.85),
                ("DOMINANT", 0.85, 0.95),
                ("MONOPOLIZED", 0.95, 1.0),
            ]),
        );
        binning.insert(
            "speaking_wpm".to_string(),
            MetricBinTable::from_edges(&[
                ("SLOW", 0.0, 55.0),
                ("MEASURED", 55.0, 70.0),
                ("OPTIMAL", 70.0, 100.0),
                ("FAST", 100.0, 140.0),
                ("RUSHED", 140.0, 400.0),
            ]),
        );

        let mut bin_scores = BTreeMap::new();
        let score_map = |pairs: &[(&str, f64)]| -> BTreeMap<String, f64> {
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        };
        bin_scores.insert(
            "gesture_active_ratio".to_string(),
            score_map(&[("INACTIVE", -1.0), ("LOW", 0.0), ("MODERATE", 1.0), ("ACTIVE", 2.0)]),
        );
        bin_scores.insert(
            "eye_contact_ratio".to_string(),
            score_map(&[("AVOIDANT", -1.5), ("LOW", 0.5), ("MODERATE", 1.5), ("ENGAGED", 2.5)]),
        );
        bin_scores.insert(
            "filler_ratio".to_string(),
            score_map(&[("CLEAN", 2.5), ("LOW", 1.0), ("MODERATE", -0.5), ("HEAVY", -2.5)]),
        );
        bin_scores.insert(
            "monotone_ratio".to_string(),
            score_map(&[("VARIED", 1.5), ("MILD", 0.5), ("FLAT", -0.5), ("MONOTONE", -1.5)]),
        );
        bin_scores.insert(
            "teacher_ratio".to_string(),
            score_map(&[
                ("BALANCED", 2.0),
                ("TEACHER_LED", 0.5),
                ("DOMINANT", -1.0),
                ("MONOPOLIZED", -2.0),
            ]),
        );
        bin_scores.insert(
            "speaking_wpm".to_string(),
            score_map(&[
                ("SLOW", -1.5),
                ("MEASURED", 0.5),
                ("OPTIMAL", 1.5),
                ("FAST", -0.5),
                ("RUSHED", -1.5),
            ]),
        );

        Self {
            preset: "default".to_string(),
            continuous_scoring: true,
            sigmoid_steepness: DEFAULT_STEEPNESS,
            confidence_weights: ConfidenceWeights::default(),
            dimensions,
            binning,
            bin_scores,
        }
    }
}

impl RubricConfig {
    /// Load from a TOML file, applying environment overrides
    pub fn from_file(path: &Path) -> AnalysisResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: RubricConfig = toml::from_str(&content)
            .map_err(|e| AnalysisError::Config(format!("{}: {}", path.display(), e)))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional TOML file, falling back to the defaults
    ///
    /// A broken config file must not block an analysis run, so failures
    /// are logged and the defaults used instead.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let mut config = match path {
            Some(p) => match Self::from_file(p) {
                Ok(c) => return c,
                Err(e) => {
                    tracing::warn!(
                        path = %p.display(),
                        error = %e,
                        "Failed to load rubric config, using defaults"
                    );
                    Self::default()
                }
            },
            None => Self::default(),
        };
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(STEEPNESS_ENV_VAR) {
            match raw.parse::<f64>() {
                Ok(s) if s.is_finite() && s > 0.0 => {
                    tracing::debug!(steepness = s, "Sigmoid steepness overridden from environment");
                    self.sigmoid_steepness = s;
                }
                _ => {
                    tracing::warn!(value = %raw, "Ignoring invalid {} value", STEEPNESS_ENV_VAR);
                }
            }
        }
    }

    /// Preset for one dimension; every dimension has a default entry
    pub fn preset_for(&self, dim: DimensionId) -> DimensionPreset {
        self.dimensions
            .get(dim.key())
            .copied()
            .unwrap_or(DimensionPreset {
                base: dim.max_score() * 0.6,
                adjust_range: dim.max_score() * 0.25,
            })
    }

    /// Highest score a dimension may reach after adjustment
    ///
    /// Evidence-only scoring never awards a perfect dimension; the cap
    /// leaves the top 5% to human review.
    pub fn effective_cap(&self, dim: DimensionId) -> f64 {
        let preset = self.preset_for(dim);
        (preset.base + preset.adjust_range).min(dim.max_score() * 0.95)
    }

    pub fn bins_for(&self, metric: &str) -> Option<&MetricBinTable> {
        self.binning.get(metric)
    }

    pub fn scores_for(&self, metric: &str) -> Option<&BTreeMap<String, f64>> {
        self.bin_scores.get(metric)
    }

    /// Structural validation of presets, weights and bin tables
    pub fn validate(&self) -> AnalysisResult<()> {
        if !(self.sigmoid_steepness.is_finite() && self.sigmoid_steepness > 0.0) {
            return Err(AnalysisError::Config(format!(
                "sigmoid_steepness must be positive, got {}",
                self.sigmoid_steepness
            )));
        }
        let weight_total = self.confidence_weights.total();
        if (weight_total - 1.0).abs() > 1e-6 {
            return Err(AnalysisError::Config(format!(
                "confidence weights must sum to 1.0, got {}",
                weight_total
            )));
        }
        for dim in DimensionId::ALL {
            let preset = self.preset_for(dim);
            if preset.base < 0.0 || preset.base > dim.max_score() {
                return Err(AnalysisError::Config(format!(
                    "dimension '{}': base {} outside 0..={}",
                    dim.key(),
                    preset.base,
                    dim.max_score()
                )));
            }
            if preset.adjust_range < 0.0 {
                return Err(AnalysisError::Config(format!(
                    "dimension '{}': negative adjust_range",
                    dim.key()
                )));
            }
        }
        for (metric, table) in &self.binning {
            table.validate(metric)?;
        }
        Ok(())
    }
}
