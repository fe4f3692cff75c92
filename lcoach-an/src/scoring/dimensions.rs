//! Per-dimension evidence scoring
//!
//! Each dimension starts from its preset base and collects additive
//! adjustments from the evidence it consumes. Adjustments are clamped
//! to the preset's range by the engine, never here, so individual rules
//! stay simple and auditable.

use crate::config::RubricConfig;
use crate::models::DimensionId;
use crate::scoring::continuous::ContinuousMapper;
use crate::types::{EvaluationInput, SourceKind};

/// Sources each dimension consumes, used for confidence attribution
pub fn sources(dim: DimensionId) -> &'static [SourceKind] {
    use SourceKind::*;
    match dim {
        DimensionId::Expertise => &[Stt, Content, Discourse],
        DimensionId::TeachingMethod => &[Content, Vision, Stt],
        DimensionId::BoardLanguage => &[Stt, Vibe],
        DimensionId::Attitude => &[Vision, Vibe, Stt],
        DimensionId::Participation => &[Stt, Discourse, Vibe],
        DimensionId::TimeAllocation => &[Vibe, Stt],
        DimensionId::Creativity => &[Content, Vision, Discourse, Stt],
    }
}

/// Shared lookup context for metric deltas
pub struct MetricContext<'a> {
    config: &'a RubricConfig,
    mapper: ContinuousMapper,
}

impl<'a> MetricContext<'a> {
    pub fn new(config: &'a RubricConfig) -> Self {
        Self {
            config,
            mapper: ContinuousMapper::new(config.sigmoid_steepness),
        }
    }

    /// Delta for one binned metric, continuous or hard depending on config
    fn metric_delta(&self, metric: &str, value: f64) -> f64 {
        let (table, scores) = match (self.config.bins_for(metric), self.config.scores_for(metric)) {
            (Some(t), Some(s)) => (t, s),
            _ => return 0.0,
        };
        if self.config.continuous_scoring {
            self.mapper.map(value, table, scores)
        } else {
            table
                .label_for(value)
                .and_then(|label| scores.get(label).copied())
                .unwrap_or(0.0)
        }
    }
}

/// Raw adjustment for one dimension, before clamping and capping
pub fn adjustment(dim: DimensionId, input: &EvaluationInput, ctx: &MetricContext<'_>) -> f64 {
    match dim {
        DimensionId::Expertise => expertise(input, ctx),
        DimensionId::TeachingMethod => teaching_method(input, ctx),
        DimensionId::BoardLanguage => board_language(input, ctx),
        DimensionId::Attitude => attitude(input, ctx),
        DimensionId::Participation => participation(input, ctx),
        DimensionId::TimeAllocation => time_allocation(input, ctx),
        DimensionId::Creativity => creativity(input, ctx),
    }
}

/// 수업 전문성: lecture substance and delivery pace
fn expertise(input: &EvaluationInput, ctx: &MetricContext<'_>) -> f64 {
    let mut delta = 0.0;
    if let Some(stt) = input.stt.value() {
        delta += if stt.word_count > 1200 {
            3.0
        } else if stt.word_count > 800 {
            1.5
        } else if stt.word_count > 500 {
            0.0
        } else if stt.word_count > 300 {
            -1.5
        } else {
            -3.0
        };
        delta += ctx.metric_delta("speaking_wpm", stt.speaking_rate);
    }
    if let Some(content) = input.content.value() {
        if content.slide_detected_ratio > 0.5 {
            delta += 1.5;
        } else if content.slide_detected_ratio > 0.3 {
            delta += 0.5;
        } else if content.slide_detected_ratio < 0.1 {
            delta -= 0.5;
        }
    }
    if let Some(disc) = input.discourse.value() {
        if disc.bloom_levels.upper() >= 0.25 {
            delta += 1.0;
        }
        if disc.bloom_levels.remember > 0.7 {
            delta -= 1.0;
        }
    }
    delta
}

/// 교수학습 방법: variety and structure of the teaching approach
fn teaching_method(input: &EvaluationInput, ctx: &MetricContext<'_>) -> f64 {
    let mut delta = 0.0;
    if let Some(content) = input.content.value() {
        if content.slide_detected_ratio > 0.6 {
            delta += 2.0;
        } else if content.slide_detected_ratio > 0.3 {
            delta += 1.0;
        } else if content.slide_detected_ratio < 0.1 {
            delta -= 1.0;
        }
        if content.avg_color_contrast > 60.0 {
            delta += 1.0;
        } else if content.avg_color_contrast < 20.0 {
            delta -= 0.5;
        }
    }
    if let Some(vision) = input.vision.value() {
        delta += ctx.metric_delta("gesture_active_ratio", vision.gesture_active_ratio);
        if vision.avg_motion_score > 25.0 {
            delta += 1.0;
        } else if vision.avg_motion_score < 5.0 {
            delta -= 0.5;
        }
    }
    if let Some(stt) = input.stt.value() {
        if stt.speaking_rate > 90.0 {
            delta += 2.0;
        } else if stt.speaking_rate > 70.0 {
            delta += 1.0;
        } else if stt.speaking_rate < 45.0 {
            delta -= 1.5;
        } else if stt.speaking_rate < 55.0 {
            delta -= 0.5;
        }
        if stt.segment_count > 100 {
            delta += 1.0;
        } else if stt.segment_count > 60 {
            delta += 0.5;
        } else if stt.segment_count < 30 {
            delta -= 0.5;
        }
    }
    delta
}

/// 판서 및 언어: verbal clarity and vocal variety
fn board_language(input: &EvaluationInput, ctx: &MetricContext<'_>) -> f64 {
    let mut delta = 0.0;
    if let Some(stt) = input.stt.value() {
        delta += ctx.metric_delta("filler_ratio", stt.filler_ratio);
        if stt.speaking_pattern.contains("Fast") || stt.speaking_pattern.contains("Slow") {
            delta -= 0.5;
        }
    }
    if let Some(vibe) = input.vibe.value() {
        delta += ctx.metric_delta("monotone_ratio", vibe.monotone_ratio);
    }
    delta
}

/// 수업 태도: presence, expression and energy
fn attitude(input: &EvaluationInput, ctx: &MetricContext<'_>) -> f64 {
    let mut delta = 0.0;
    if let Some(vision) = input.vision.value() {
        delta += ctx.metric_delta("eye_contact_ratio", vision.eye_contact_ratio);
        if vision.avg_expression_score > 70.0 {
            delta += 1.5;
        } else if vision.avg_expression_score > 55.0 {
            delta += 0.5;
        } else if vision.avg_expression_score < 30.0 {
            delta -= 1.0;
        }
    }
    if let Some(vibe) = input.vibe.value() {
        if vibe.energy_distribution.high > 0.4 {
            delta += 1.5;
        } else if vibe.energy_distribution.high > 0.25 {
            delta += 0.5;
        }
        if vibe.energy_distribution.low > 0.5 {
            delta -= 1.0;
        }
    }
    if let Some(stt) = input.stt.value() {
        if stt.speaking_rate > 90.0 {
            delta += 1.0;
        } else if stt.speaking_rate < 40.0 {
            delta -= 1.0;
        }
    }
    delta
}

/// 학생 참여: student voice and interaction quality
fn participation(input: &EvaluationInput, ctx: &MetricContext<'_>) -> f64 {
    let mut delta = 0.0;
    if let Some(stt) = input.stt.value() {
        delta += if stt.student_turns == 0 {
            // A lecture with zero student turns is a monologue
            -2.5
        } else if stt.student_turns >= 10 {
            2.0
        } else if stt.student_turns >= 5 {
            1.0
        } else {
            0.0
        };
        delta += ctx.metric_delta("teacher_ratio", stt.teacher_ratio);
        if stt.question_count >= 10 {
            delta += 1.5;
        } else if stt.question_count >= 5 {
            delta += 0.5;
        } else if stt.question_count == 0 {
            delta -= 1.5;
        }
    }
    if let Some(disc) = input.discourse.value() {
        if disc.interaction_score >= 80.0 {
            delta += 1.5;
        } else if disc.interaction_score >= 60.0 {
            delta += 0.5;
        } else if disc.interaction_score < 30.0 {
            delta -= 1.5;
        }
        if disc.question_types.open_ended > disc.question_types.closed {
            delta += 1.0;
        }
    }
    if let Some(vibe) = input.vibe.value() {
        // Some silence means students get room to think and answer
        if (0.15..=0.30).contains(&vibe.avg_silence_ratio) {
            delta += 0.5;
        } else if vibe.avg_silence_ratio > 0.45 {
            delta -= 1.0;
        }
    }
    delta
}

/// 시간 배분: pacing and energy management over the session
fn time_allocation(input: &EvaluationInput, _ctx: &MetricContext<'_>) -> f64 {
    let mut delta = 0.0;
    if let Some(vibe) = input.vibe.value() {
        let ed = &vibe.energy_distribution;
        let levels = [ed.low, ed.normal, ed.high];
        if levels.iter().sum::<f64>() > 0.0 {
            let max = levels.iter().cloned().fold(f64::MIN, f64::max);
            let min = levels.iter().cloned().fold(f64::MAX, f64::min);
            let spread = max - min;
            if spread < 0.25 {
                delta += 2.0;
            } else if spread < 0.4 {
                delta += 1.0;
            } else if spread > 0.65 {
                delta -= 1.0;
            }
        }
        if vibe.monotone_ratio < 0.2 {
            delta += 1.0;
        } else if vibe.monotone_ratio > 0.5 {
            delta -= 0.5;
        }
    }
    if let Some(stt) = input.stt.value() {
        if (500.0..=900.0).contains(&stt.duration_seconds) {
            delta += 0.5;
        } else if stt.duration_seconds > 1200.0 || stt.duration_seconds < 300.0 {
            delta -= 0.5;
        }
    }
    delta
}

/// 창의성: variety of materials and higher-order engagement
fn creativity(input: &EvaluationInput, _ctx: &MetricContext<'_>) -> f64 {
    let mut delta = 0.0;
    if let Some(content) = input.content.value() {
        if content.slide_detected_ratio > 0.5 {
            delta += 0.8;
        } else if content.slide_detected_ratio > 0.3 {
            delta += 0.3;
        }
        if content.avg_color_contrast > 60.0 {
            delta += 0.5;
        } else if content.avg_color_contrast < 20.0 {
            delta -= 0.3;
        }
    }
    if let Some(vision) = input.vision.value() {
        if vision.avg_motion_score > 25.0 {
            delta += 0.5;
        }
        if vision.avg_body_openness > 0.7 {
            delta += 0.3;
        }
    }
    if let Some(stt) = input.stt.value() {
        if stt.segment_count > 100 && stt.word_count > 800 {
            delta += 0.8;
        } else if stt.segment_count > 60 && stt.word_count > 500 {
            delta += 0.4;
        } else if stt.word_count < 300 {
            delta -= 0.4;
        }
        if stt.speaking_rate > 80.0 {
            delta += 0.3;
        } else if stt.speaking_rate < 40.0 {
            delta -= 0.3;
        }
    }
    if let Some(disc) = input.discourse.value() {
        let upper = disc.bloom_levels.upper();
        if upper >= 0.3 {
            delta += 0.5;
        } else if upper <= 0.05 {
            delta -= 0.5;
        }
    }
    delta
}
