//! Rubric result models
//!
//! Output types produced by the rubric engine. Results carry no
//! wall-clock data so that identical inputs always produce identical
//! results; timestamps are attached by the persistence layer.

use serde::{Deserialize, Serialize};

/// The seven rubric dimensions
///
/// The Korean labels are stable identifiers used in reports and as
/// join keys in stored results. Do not rename them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DimensionId {
    Expertise,
    TeachingMethod,
    BoardLanguage,
    Attitude,
    Participation,
    TimeAllocation,
    Creativity,
}

impl DimensionId {
    pub const ALL: [DimensionId; 7] = [
        DimensionId::Expertise,
        DimensionId::TeachingMethod,
        DimensionId::BoardLanguage,
        DimensionId::Attitude,
        DimensionId::Participation,
        DimensionId::TimeAllocation,
        DimensionId::Creativity,
    ];

    /// Korean display label
    pub fn label(&self) -> &'static str {
        match self {
            DimensionId::Expertise => "수업 전문성",
            DimensionId::TeachingMethod => "교수학습 방법",
            DimensionId::BoardLanguage => "판서 및 언어",
            DimensionId::Attitude => "수업 태도",
            DimensionId::Participation => "학생 참여",
            DimensionId::TimeAllocation => "시간 배분",
            DimensionId::Creativity => "창의성",
        }
    }

    /// Reverse lookup from the Korean display label
    pub fn from_label(label: &str) -> Option<DimensionId> {
        DimensionId::ALL.into_iter().find(|d| d.label() == label)
    }

    /// Stable ASCII key for storage and lookup
    pub fn key(&self) -> &'static str {
        match self {
            DimensionId::Expertise => "expertise",
            DimensionId::TeachingMethod => "teaching_method",
            DimensionId::BoardLanguage => "board_language",
            DimensionId::Attitude => "attitude",
            DimensionId::Participation => "participation",
            DimensionId::TimeAllocation => "time_allocation",
            DimensionId::Creativity => "creativity",
        }
    }

    /// Maximum points this dimension contributes to the 100-point total
    pub fn max_score(&self) -> f64 {
        match self {
            DimensionId::Expertise => 20.0,
            DimensionId::TeachingMethod => 20.0,
            DimensionId::BoardLanguage => 15.0,
            DimensionId::Attitude => 15.0,
            DimensionId::Participation => 15.0,
            DimensionId::TimeAllocation => 10.0,
            DimensionId::Creativity => 5.0,
        }
    }
}

/// Qualitative band for one dimension, from its score ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeBand {
    Excellent,
    Good,
    Average,
    NeedsWork,
}

impl GradeBand {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.85 {
            GradeBand::Excellent
        } else if ratio >= 0.70 {
            GradeBand::Good
        } else if ratio >= 0.55 {
            GradeBand::Average
        } else {
            GradeBand::NeedsWork
        }
    }

    /// Korean display label
    pub fn label(&self) -> &'static str {
        match self {
            GradeBand::Excellent => "우수",
            GradeBand::Good => "양호",
            GradeBand::Average => "보통",
            GradeBand::NeedsWork => "노력 필요",
        }
    }
}

/// Letter grade for the 100-point total
pub fn letter_grade(total: f64) -> &'static str {
    const TABLE: [(f64, &str); 10] = [
        (90.0, "A+"),
        (85.0, "A"),
        (80.0, "A-"),
        (75.0, "B+"),
        (70.0, "B"),
        (65.0, "B-"),
        (60.0, "C+"),
        (55.0, "C"),
        (50.0, "C-"),
        (0.0, "D"),
    ];
    for (cutoff, grade) in TABLE {
        if total >= cutoff {
            return grade;
        }
    }
    "D"
}

/// Score for a single rubric dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: DimensionId,
    pub score: f64,
    pub max_score: f64,
    /// How much evidence backed this dimension (0.0..=1.0)
    pub confidence: f64,
    pub band: GradeBand,
}

impl DimensionScore {
    pub fn ratio(&self) -> f64 {
        if self.max_score > 0.0 {
            self.score / self.max_score
        } else {
            0.0
        }
    }
}

/// Evidence coverage metadata for one evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceReport {
    /// Weighted coverage of the five sources (0.0..=1.0)
    pub overall_confidence: f64,
    /// Plain fraction of sources that produced output (0.0..=1.0)
    pub data_completeness: f64,
    pub available_sources: Vec<String>,
}

/// Strength and weakness profile derived from the dimension scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Korean labels of dimensions at 80% or better
    pub strengths: Vec<String>,
    /// Korean labels of dimensions below 60%
    pub improvements: Vec<String>,
    pub top_dimension: String,
    pub weakest_dimension: String,
}

/// Scoring mode used for an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringMode {
    /// Sigmoid-weighted continuous mapping over bin centers
    Continuous,
    /// Hard bin lookup, kept for comparison runs
    Binned,
}

/// Full rubric evaluation output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubricResult {
    pub total_score: f64,
    pub grade: String,
    pub dimension_scores: Vec<DimensionScore>,
    pub confidence: ConfidenceReport,
    pub profile: ProfileSummary,
    /// Rubric scores complement human review and never replace it
    pub is_supplementary: bool,
    pub scoring_mode: ScoringMode,
    pub preset: String,
    /// Version of the engine that produced this result
    pub version: String,
}

impl RubricResult {
    pub fn dimension(&self, id: DimensionId) -> Option<&DimensionScore> {
        self.dimension_scores.iter().find(|d| d.dimension == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_max_scores_sum_to_100() {
        let total: f64 = DimensionId::ALL.iter().map(|d| d.max_score()).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn letter_grade_boundaries() {
        assert_eq!(letter_grade(90.0), "A+");
        assert_eq!(letter_grade(89.9), "A");
        assert_eq!(letter_grade(70.0), "B");
        assert_eq!(letter_grade(49.9), "D");
        assert_eq!(letter_grade(0.0), "D");
    }

    #[test]
    fn grade_band_thresholds() {
        assert_eq!(GradeBand::from_ratio(0.85), GradeBand::Excellent);
        assert_eq!(GradeBand::from_ratio(0.84), GradeBand::Good);
        assert_eq!(GradeBand::from_ratio(0.70), GradeBand::Good);
        assert_eq!(GradeBand::from_ratio(0.55), GradeBand::Average);
        assert_eq!(GradeBand::from_ratio(0.54), GradeBand::NeedsWork);
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(DimensionId::Expertise.label(), "수업 전문성");
        assert_eq!(DimensionId::Creativity.key(), "creativity");
        assert_eq!(GradeBand::NeedsWork.label(), "노력 필요");
    }
}
