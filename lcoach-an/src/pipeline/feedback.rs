//! Feedback synthesis
//!
//! Turns the scored rubric into teacher-facing commentary: a band
//! comment per dimension, the pedagogy theory it leans on, and concrete
//! improvement tips where the evidence warrants them.

use crate::models::{DimensionId, DimensionScore, GradeBand, RubricResult};
use crate::types::EvaluationInput;
use serde::{Deserialize, Serialize};

/// Feedback for one dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionFeedback {
    pub dimension: DimensionId,
    pub comment: String,
    pub theory_reference: String,
    pub improvement_tips: Vec<String>,
}

/// Complete feedback report for one evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub headline: String,
    pub dimension_feedback: Vec<DimensionFeedback>,
}

/// Pedagogy theory each dimension is anchored to
fn theory_reference(dim: DimensionId) -> &'static str {
    match dim {
        DimensionId::Expertise => {
            "구성주의 학습이론 - 학습 목표의 명확한 제시는 학생의 인지적 스캐폴딩을 제공합니다."
        }
        DimensionId::TeachingMethod => {
            "다중지능이론(Gardner) - 다양한 교수법은 학생의 서로 다른 지능 유형에 호소합니다."
        }
        DimensionId::BoardLanguage => {
            "이중부호화이론(Paivio) - 시각적, 언어적 정보의 병행 제시가 학습 효과를 높입니다."
        }
        DimensionId::Attitude => {
            "사회학습이론(Bandura) - 교사의 열정적 태도는 학생의 학습 동기에 모델링 효과를 줍니다."
        }
        DimensionId::Participation => {
            "ZPD(Vygotsky) - 적절한 발문은 학생의 근접발달영역에서의 학습을 촉진합니다."
        }
        DimensionId::TimeAllocation => {
            "ARCS 모델(Keller) - 적절한 시간 배분은 학습자의 주의를 효과적으로 유지합니다."
        }
        DimensionId::Creativity => {
            "창의적 문제해결(Torrance) - 독창적 수업 설계는 학생의 확산적 사고를 자극합니다."
        }
    }
}

/// Band comment for one dimension
fn band_comment(dim: DimensionId, band: GradeBand) -> &'static str {
    use DimensionId::*;
    use GradeBand::*;
    match (dim, band) {
        (Expertise, Excellent) => "학습 목표가 명확하고 내용 구조화가 매우 체계적입니다.",
        (Expertise, Good) => "학습 목표와 내용 구성이 전반적으로 양호합니다.",
        (Expertise, Average) => "내용 전달이 보통 수준입니다. 구조화가 필요합니다.",
        (Expertise, NeedsWork) => "학습 목표를 명확히 하고 내용을 체계적으로 구성하세요.",

        (TeachingMethod, Excellent) => "다양한 교수학습 방법을 매우 효과적으로 활용합니다.",
        (TeachingMethod, Good) => "교수법이 양호하며 시각자료 활용도 적절합니다.",
        (TeachingMethod, Average) => "교수법이 보통 수준입니다. 다양한 전략을 시도하세요.",
        (TeachingMethod, NeedsWork) => "다양한 교수학습 전략과 매체 활용이 필요합니다.",

        (BoardLanguage, Excellent) => "언어 표현이 명확하고 발화가 매우 깨끗합니다.",
        (BoardLanguage, Good) => "언어 사용이 양호하나 미세한 개선 여지가 있습니다.",
        (BoardLanguage, Average) => "습관어나 단조로운 어조 개선이 필요합니다.",
        (BoardLanguage, NeedsWork) => "발화 습관을 개선하고 핵심 용어를 정확히 사용하세요.",

        (Attitude, Excellent) => "열정적인 태도와 시선 접촉이 매우 우수합니다.",
        (Attitude, Good) => "전반적으로 양호한 태도이나 소통 강화가 필요합니다.",
        (Attitude, Average) => "태도 전반에 개선이 필요합니다.",
        (Attitude, NeedsWork) => "시선 접촉과 표정 관리를 통해 열정을 전달하세요.",

        (Participation, Excellent) => "학생 참여를 효과적으로 이끌어내며 상호작용이 활발합니다.",
        (Participation, Good) => "참여 유도가 양호하나 상호작용을 더 늘리세요.",
        (Participation, Average) => "학생 참여 유도가 부족합니다.",
        (Participation, NeedsWork) => "발문과 피드백 전략을 적극적으로 활용하세요.",

        (TimeAllocation, Excellent) => "시간 배분이 매우 적절하며 수업 흐름이 자연스럽습니다.",
        (TimeAllocation, Good) => "시간 배분이 양호하나 정리 단계를 확보하세요.",
        (TimeAllocation, Average) => "시간 배분에 개선이 필요합니다.",
        (TimeAllocation, NeedsWork) => "시간 배분을 사전에 계획하고 각 단계에 충실하세요.",

        (Creativity, Excellent) => "창의적인 수업 설계와 전달이 돋보입니다.",
        (Creativity, Good) => "창의성이 양호한 수준입니다.",
        (Creativity, Average) => "창의적 요소를 더 추가하세요.",
        (Creativity, NeedsWork) => "독창적인 활동과 시각적 매체를 적극 활용하세요.",
    }
}

fn tips_for(dim: DimensionId, score: &DimensionScore, input: &EvaluationInput) -> Vec<String> {
    let mut tips = Vec::new();
    match dim {
        DimensionId::Expertise => {
            if let Some(stt) = input.stt.value() {
                if stt.word_count < 500 {
                    tips.push("충분한 설명을 통해 학습 내용을 풍부하게 전달하세요.".to_string());
                }
            }
            if !input.content.is_available() {
                tips.push("시각적 자료를 활용하여 핵심 개념을 구조화하세요.".to_string());
            }
        }
        DimensionId::TeachingMethod => {
            if !input.vision.is_available() && !input.content.is_available() {
                tips.push("다양한 교수학습 매체를 활용하세요.".to_string());
            }
        }
        DimensionId::BoardLanguage => {
            if let Some(stt) = input.stt.value() {
                if stt.filler_ratio >= 0.04 {
                    tips.push(format!(
                        "습관어를 줄이세요 (현재: {:.1}%).",
                        stt.filler_ratio * 100.0
                    ));
                }
            }
            if let Some(vibe) = input.vibe.value() {
                if vibe.monotone_ratio >= 0.4 {
                    tips.push("목소리 톤에 변화를 주어 핵심 내용을 강조하세요.".to_string());
                }
            }
        }
        DimensionId::Attitude => {
            if let Some(vision) = input.vision.value() {
                if vision.eye_contact_ratio < 0.35 {
                    tips.push("학생들과 시선을 고르게 맞추며 소통하세요.".to_string());
                }
            }
            if let Some(vibe) = input.vibe.value() {
                if vibe.energy_distribution.low > 0.5 {
                    tips.push("에너지 수준을 높여 활기찬 수업 분위기를 만드세요.".to_string());
                }
            }
        }
        DimensionId::Participation => {
            if let Some(disc) = input.discourse.value() {
                if disc.question_types.open_ended <= disc.question_types.closed {
                    tips.push("개방형 질문으로 학생 사고를 자극하세요.".to_string());
                }
            }
            if !input.vibe.is_available() {
                tips.push("적절한 발문으로 학생 참여를 유도하세요.".to_string());
            }
        }
        DimensionId::TimeAllocation => {
            if score.ratio() < 0.7 {
                tips.push("도입(10%)-전개(70%)-정리(20%) 비율로 시간을 배분하세요.".to_string());
            }
            if !input.vibe.is_available() {
                tips.push("수업 에너지를 전체 시간에 걸쳐 고르게 배분하세요.".to_string());
            }
        }
        DimensionId::Creativity => {
            if score.score < 3.5 {
                tips.push("ICT 도구를 활용한 창의적 수업 설계를 시도하세요.".to_string());
            }
        }
    }
    tips
}

/// Dimensions covered per report; the weakest ones take the slots
pub const MAX_FEEDBACK_DIMENSIONS: usize = 5;

/// Builds the teacher-facing feedback report
pub struct FeedbackSynthesizer;

impl FeedbackSynthesizer {
    pub fn synthesize(result: &RubricResult, input: &EvaluationInput) -> FeedbackReport {
        // Weakest dimensions first; ties keep the rubric order
        let mut ranked: Vec<&DimensionScore> = result.dimension_scores.iter().collect();
        ranked.sort_by(|a, b| a.ratio().total_cmp(&b.ratio()));

        let dimension_feedback = ranked
            .into_iter()
            .take(MAX_FEEDBACK_DIMENSIONS)
            .map(|d| DimensionFeedback {
                dimension: d.dimension,
                comment: band_comment(d.dimension, d.band).to_string(),
                theory_reference: theory_reference(d.dimension).to_string(),
                improvement_tips: tips_for(d.dimension, d, input),
            })
            .collect();

        let headline = format!(
            "종합 {:.1}점 ({}) — 강점: {}, 보완: {}",
            result.total_score,
            result.grade,
            result.profile.top_dimension,
            result.profile.weakest_dimension
        );

        FeedbackReport {
            headline,
            dimension_feedback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::RubricEngine;
    use crate::types::{SourceInput, SttResult};

    fn weak_transcript() -> SttResult {
        SttResult {
            word_count: 180,
            duration_seconds: 600.0,
            speaking_rate: 18.0,
            filler_ratio: 0.09,
            speaking_pattern: "느림 (Slow)".to_string(),
            segment_count: 12,
            student_turns: 0,
            interaction_count: 0,
            teacher_ratio: 0.98,
            question_count: 0,
        }
    }

    #[test]
    fn covered_dimensions_get_a_comment_and_theory() {
        let engine = RubricEngine::with_defaults();
        let input = EvaluationInput::default();
        let result = engine.evaluate(&input);
        let report = FeedbackSynthesizer::synthesize(&result, &input);

        assert_eq!(report.dimension_feedback.len(), MAX_FEEDBACK_DIMENSIONS);
        for fb in &report.dimension_feedback {
            assert!(!fb.comment.is_empty());
            assert!(!fb.theory_reference.is_empty());
        }
        assert!(report.headline.contains("종합"));
    }

    #[test]
    fn weakest_dimensions_take_the_feedback_slots() {
        let engine = RubricEngine::with_defaults();
        let input = EvaluationInput {
            stt: SourceInput::Available(weak_transcript()),
            ..Default::default()
        };
        let result = engine.evaluate(&input);
        let report = FeedbackSynthesizer::synthesize(&result, &input);

        assert_eq!(report.dimension_feedback.len(), MAX_FEEDBACK_DIMENSIONS);
        let ratios: Vec<f64> = report
            .dimension_feedback
            .iter()
            .map(|fb| {
                let d = result.dimension(fb.dimension).expect("scored dimension");
                d.ratio()
            })
            .collect();
        assert!(
            ratios.windows(2).all(|w| w[0] <= w[1]),
            "feedback not ordered weakest first: {ratios:?}"
        );

        let covered: Vec<DimensionId> =
            report.dimension_feedback.iter().map(|fb| fb.dimension).collect();
        let weakest = DimensionId::from_label(&result.profile.weakest_dimension)
            .expect("weakest dimension label");
        assert_eq!(covered[0], weakest);
    }

    #[test]
    fn weak_evidence_produces_concrete_tips() {
        let engine = RubricEngine::with_defaults();
        let input = EvaluationInput {
            stt: SourceInput::Available(weak_transcript()),
            ..Default::default()
        };
        let result = engine.evaluate(&input);
        let report = FeedbackSynthesizer::synthesize(&result, &input);

        let board = report
            .dimension_feedback
            .iter()
            .find(|f| f.dimension == DimensionId::BoardLanguage)
            .expect("board feedback");
        assert!(board.improvement_tips.iter().any(|t| t.contains("습관어")));

        let expertise = report
            .dimension_feedback
            .iter()
            .find(|f| f.dimension == DimensionId::Expertise)
            .expect("expertise feedback");
        assert!(!expertise.improvement_tips.is_empty());
    }
}
