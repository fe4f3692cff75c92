//! Rubric engine
//!
//! Assembles per-dimension scores, confidence metadata and the profile
//! summary into a `RubricResult`. Evaluation is pure: the same input
//! and configuration always produce the same result.

use crate::config::RubricConfig;
use crate::error::AnalysisResult;
use crate::models::{
    ConfidenceReport, DimensionId, DimensionScore, GradeBand, ProfileSummary, RubricResult,
    ScoringMode, letter_grade,
};
use crate::scoring::confidence::ConfidenceAggregator;
use crate::scoring::dimensions::{self, MetricContext};
use crate::types::EvaluationInput;

/// Version stamp carried on every result and persisted row
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Round to two decimals for stable presentation
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Seven-dimension rubric scorer
pub struct RubricEngine {
    config: RubricConfig,
    aggregator: ConfidenceAggregator,
}

impl RubricEngine {
    pub fn new(config: RubricConfig) -> AnalysisResult<Self> {
        config.validate()?;
        let aggregator = ConfidenceAggregator::new(config.confidence_weights.clone());
        Ok(Self { config, aggregator })
    }

    /// Engine over the built-in default configuration
    pub fn with_defaults() -> Self {
        let config = RubricConfig::default();
        let aggregator = ConfidenceAggregator::new(config.confidence_weights.clone());
        Self { config, aggregator }
    }

    pub fn config(&self) -> &RubricConfig {
        &self.config
    }

    /// Evaluate one lecture's evidence against the rubric
    pub fn evaluate(&self, input: &EvaluationInput) -> RubricResult {
        let ctx = MetricContext::new(&self.config);
        let mut dimension_scores = Vec::with_capacity(DimensionId::ALL.len());

        for dim in DimensionId::ALL {
            let preset = self.config.preset_for(dim);
            let raw = dimensions::adjustment(dim, input, &ctx);
            let clamped = raw.clamp(-preset.adjust_range, preset.adjust_range);
            let score = round2((preset.base + clamped).clamp(0.0, self.config.effective_cap(dim)));
            let confidence =
                self.aggregator.dimension_confidence(dimensions::sources(dim), input);

            tracing::debug!(
                dimension = dim.key(),
                raw_adjustment = raw,
                score = score,
                confidence = confidence,
                "Dimension scored"
            );

            dimension_scores.push(DimensionScore {
                dimension: dim,
                score,
                max_score: dim.max_score(),
                confidence: round2(confidence),
                band: GradeBand::from_ratio(score / dim.max_score()),
            });
        }

        let total_score = round2(dimension_scores.iter().map(|d| d.score).sum());
        let grade = letter_grade(total_score).to_string();
        let confidence = self.aggregator.report(input);
        let profile = build_profile(&dimension_scores);

        tracing::info!(
            total_score = total_score,
            grade = %grade,
            overall_confidence = confidence.overall_confidence,
            sources = confidence.available_sources.len(),
            "Rubric evaluation complete"
        );

        RubricResult {
            total_score,
            grade,
            dimension_scores,
            confidence,
            profile,
            is_supplementary: true,
            scoring_mode: if self.config.continuous_scoring {
                ScoringMode::Continuous
            } else {
                ScoringMode::Binned
            },
            preset: self.config.preset.clone(),
            version: ENGINE_VERSION.to_string(),
        }
    }

    pub fn confidence_report(&self, input: &EvaluationInput) -> ConfidenceReport {
        self.aggregator.report(input)
    }
}

fn build_profile(scores: &[DimensionScore]) -> ProfileSummary {
    // Same cutoffs as the growth profile: strengths at 80% or better,
    // improvements below 60%.
    let strengths = scores
        .iter()
        .filter(|d| d.ratio() >= 0.80)
        .map(|d| d.dimension.label().to_string())
        .collect();
    let improvements = scores
        .iter()
        .filter(|d| d.ratio() < 0.60)
        .map(|d| d.dimension.label().to_string())
        .collect();

    // Ties resolve to the earlier dimension so the profile is stable
    let mut top = &scores[0];
    let mut weakest = &scores[0];
    for d in &scores[1..] {
        if d.ratio() > top.ratio() {
            top = d;
        }
        if d.ratio() < weakest.ratio() {
            weakest = d;
        }
    }

    ProfileSummary {
        strengths,
        improvements,
        top_dimension: top.dimension.label().to_string(),
        weakest_dimension: weakest.dimension.label().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceInput, SttResult};

    #[test]
    fn empty_input_scores_bases_with_zero_confidence() {
        let engine = RubricEngine::with_defaults();
        let result = engine.evaluate(&EvaluationInput::default());

        // Base points: 14 + 14 + 10 + 10 + 10 + 7 + 3
        assert!((result.total_score - 68.0).abs() < 1e-9);
        assert_eq!(result.confidence.overall_confidence, 0.0);
        assert_eq!(result.confidence.data_completeness, 0.0);
        assert!(result.is_supplementary);
    }

    #[test]
    fn scores_stay_within_dimension_bounds() {
        let engine = RubricEngine::with_defaults();
        let absurd = EvaluationInput {
            stt: SourceInput::Available(SttResult {
                word_count: 1_000_000,
                duration_seconds: 600.0,
                speaking_rate: 95.0,
                filler_ratio: 0.0,
                speaking_pattern: "Conversational".to_string(),
                segment_count: 10_000,
                student_turns: 500,
                interaction_count: 500,
                teacher_ratio: 0.5,
                question_count: 200,
            }),
            ..Default::default()
        };
        let result = engine.evaluate(&absurd);
        for d in &result.dimension_scores {
            assert!(d.score >= 0.0, "{} below zero", d.dimension.key());
            assert!(
                d.score < d.max_score,
                "{} reached its max despite the cap",
                d.dimension.key()
            );
        }
    }

    #[test]
    fn evaluation_is_deterministic() {
        let input = EvaluationInput {
            stt: SourceInput::Available(SttResult {
                word_count: 688,
                duration_seconds: 605.0,
                speaking_rate: 68.2,
                filler_ratio: 0.061,
                speaking_pattern: "느림 (Slow)".to_string(),
                segment_count: 153,
                student_turns: 30,
                interaction_count: 43,
                teacher_ratio: 0.907,
                question_count: 28,
            }),
            ..Default::default()
        };
        let totals: Vec<f64> = (0..5)
            .map(|_| RubricEngine::with_defaults().evaluate(&input).total_score)
            .collect();
        assert!(totals.windows(2).all(|w| w[0] == w[1]), "{totals:?}");
    }

    #[test]
    fn profile_thresholds_sit_at_80_and_60_percent() {
        let mk = |dim: DimensionId, score: f64| DimensionScore {
            dimension: dim,
            score,
            max_score: dim.max_score(),
            confidence: 0.5,
            band: GradeBand::from_ratio(score / dim.max_score()),
        };
        let scores = vec![
            mk(DimensionId::Expertise, 16.0),      // exactly 80%
            mk(DimensionId::TeachingMethod, 15.8), // 79%
            mk(DimensionId::BoardLanguage, 9.0),   // exactly 60%
            mk(DimensionId::Attitude, 8.85),       // 59%
        ];
        let profile = build_profile(&scores);
        assert_eq!(profile.strengths, vec!["수업 전문성"]);
        assert_eq!(profile.improvements, vec!["수업 태도"]);
    }

    #[test]
    fn results_carry_the_engine_version() {
        let engine = RubricEngine::with_defaults();
        let result = engine.evaluate(&EvaluationInput::default());
        assert_eq!(result.version, ENGINE_VERSION);
        assert!(!result.version.is_empty());
    }

    #[test]
    fn profile_names_top_and_weakest() {
        let engine = RubricEngine::with_defaults();
        let result = engine.evaluate(&EvaluationInput::default());
        assert!(!result.profile.top_dimension.is_empty());
        assert!(!result.profile.weakest_dimension.is_empty());
    }
}
