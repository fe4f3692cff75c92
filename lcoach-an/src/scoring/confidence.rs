//! Evidence confidence aggregation
//!
//! Scores are only as trustworthy as the evidence behind them. The
//! aggregator reports how much of the expected input actually arrived,
//! both overall and per dimension.

use crate::config::ConfidenceWeights;
use crate::models::ConfidenceReport;
use crate::types::{EvaluationInput, SourceKind};

/// Per-source bonus added to a dimension's confidence when the source
/// is available and that dimension consumes it
fn source_bonus(kind: SourceKind) -> f64 {
    match kind {
        SourceKind::Vision => 0.15,
        SourceKind::Stt => 0.25,
        SourceKind::Content => 0.10,
        SourceKind::Vibe => 0.10,
        SourceKind::Discourse => 0.15,
    }
}

/// Confidence base before any source bonus
const DIMENSION_BASE_CONFIDENCE: f64 = 0.5;

/// Computes confidence metadata from input availability
#[derive(Debug, Clone)]
pub struct ConfidenceAggregator {
    weights: ConfidenceWeights,
}

impl ConfidenceAggregator {
    pub fn new(weights: ConfidenceWeights) -> Self {
        Self { weights }
    }

    /// Overall confidence report for one evaluation
    ///
    /// Overall confidence is the weight sum of available sources; with
    /// weights summing to 1.0 it is 1.0 for full input and 0.0 when
    /// nothing arrived. Completeness is the plain availability fraction.
    pub fn report(&self, input: &EvaluationInput) -> ConfidenceReport {
        let overall: f64 = SourceKind::ALL
            .iter()
            .filter(|k| input.is_source_available(**k))
            .map(|k| self.weights.weight(*k))
            .sum();
        ConfidenceReport {
            overall_confidence: overall.clamp(0.0, 1.0),
            data_completeness: input.available_count() as f64 / SourceKind::ALL.len() as f64,
            available_sources: input.available_source_names(),
        }
    }

    /// Confidence for one dimension given the sources it consumes
    pub fn dimension_confidence(&self, sources: &[SourceKind], input: &EvaluationInput) -> f64 {
        let mut confidence = DIMENSION_BASE_CONFIDENCE;
        for kind in sources {
            if input.is_source_available(*kind) {
                confidence += source_bonus(*kind);
            }
        }
        confidence.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceInput, SttResult};

    fn stt_sample() -> SttResult {
        SttResult {
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
        }
    }

    #[test]
    fn empty_input_has_zero_confidence() {
        let agg = ConfidenceAggregator::new(ConfidenceWeights::default());
        let report = agg.report(&EvaluationInput::default());
        assert_eq!(report.overall_confidence, 0.0);
        assert_eq!(report.data_completeness, 0.0);
        assert!(report.available_sources.is_empty());
    }

    #[test]
    fn stt_only_input_reports_stt_weight() {
        let agg = ConfidenceAggregator::new(ConfidenceWeights::default());
        let input = EvaluationInput {
            stt: SourceInput::Available(stt_sample()),
            ..Default::default()
        };
        let report = agg.report(&input);
        assert!((report.overall_confidence - 0.30).abs() < 1e-9);
        assert!((report.data_completeness - 0.2).abs() < 1e-9);
        assert_eq!(report.available_sources, vec!["stt".to_string()]);
    }

    #[test]
    fn confidence_grows_with_availability() {
        let agg = ConfidenceAggregator::new(ConfidenceWeights::default());
        let empty = agg.report(&EvaluationInput::default()).overall_confidence;
        let partial = agg
            .report(&EvaluationInput {
                stt: SourceInput::Available(stt_sample()),
                ..Default::default()
            })
            .overall_confidence;
        assert!(partial > empty);
    }

    #[test]
    fn dimension_confidence_is_bounded() {
        let agg = ConfidenceAggregator::new(ConfidenceWeights::default());
        let input = EvaluationInput {
            stt: SourceInput::Available(stt_sample()),
            ..Default::default()
        };
        let all = SourceKind::ALL;
        let c = agg.dimension_confidence(&all, &input);
        assert!((0.0..=1.0).contains(&c));
        // stt available and consumed: base 0.5 + 0.25
        assert!((c - 0.75).abs() < 1e-9);
    }

    #[test]
    fn failed_source_adds_nothing() {
        let agg = ConfidenceAggregator::new(ConfidenceWeights::default());
        let input = EvaluationInput {
            stt: SourceInput::Failed {
                error: "decoder crashed".to_string(),
            },
            ..Default::default()
        };
        let c = agg.dimension_confidence(&[SourceKind::Stt], &input);
        assert!((c - 0.5).abs() < 1e-9);
    }
}
