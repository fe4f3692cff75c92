//! Teacher growth analysis
//!
//! Works over stored evaluations of the same teacher: per-dimension
//! linear trends, a strength/weakness profile, rule-based improvement
//! feedback and a 3/6/12 week practice roadmap.

use crate::db::ScoreSnapshot;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::DimensionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rule-based improvement tips per dimension
fn improvement_tips(dim: DimensionId) -> &'static [&'static str; 3] {
    match dim {
        DimensionId::Expertise => &[
            "핵심 개념 간 연결고리를 명시적으로 설명해 보세요",
            "학생 수준에 맞는 사례와 비유를 추가하세요",
            "최신 교육과정 성취기준과의 연계를 강화하세요",
        ],
        DimensionId::TeachingMethod => &[
            "다양한 교수 전략(토론, 모둠, 실험)을 번갈아 활용하세요",
            "발문 유형을 다양화하세요 (개방형, 비계 설정형)",
            "학생 활동 시간을 늘리고, 교사 중심 설명을 줄이세요",
        ],
        DimensionId::BoardLanguage => &[
            "필러 사용(음, 어)을 줄이는 연습을 하세요",
            "핵심 용어를 반복적으로 강조하여 학습을 지원하세요",
            "학생 발화를 재구성(revoicing)하여 참여를 유도하세요",
        ],
        DimensionId::Attitude => &[
            "학생과의 시선 접촉 빈도를 높이세요",
            "제스처를 활용하여 설명을 보강하세요",
            "교실 전체를 이동하며 가까이 다가가세요",
        ],
        DimensionId::Participation => &[
            "모든 학생이 참여할 수 있는 구조화된 활동을 설계하세요",
            "대기 시간을 충분히 확보하세요 (3초 이상)",
            "소그룹 토론 후 전체 공유 구조를 활용하세요",
        ],
        DimensionId::TimeAllocation => &[
            "단계별 시간 배분을 사전에 계획하세요",
            "전환(transition) 시간을 최소화하는 루틴을 만드세요",
            "도입-전개-정리 비율을 1:6:3으로 목표해 보세요",
        ],
        DimensionId::Creativity => &[
            "다양한 매체(영상, 실물, ICT)를 활용하세요",
            "학생의 창의적 사고를 유발하는 발문을 추가하세요",
            "교과 간 융합 요소를 시도해 보세요",
        ],
    }
}

const WEEKLY_ACTIVITIES: [&str; 12] = [
    "자기 수업 영상 분석 (10분)",
    "동료 수업 참관 및 피드백 작성",
    "교수법 논문/자료 1편 읽기",
    "마이크로티칭 실습 (5분 모의수업)",
    "수업 일지 작성 및 성찰",
    "학생 반응 분석 체크리스트 작성",
    "수업 설계안 작성 및 동료 검토",
    "교수학습 전략 워크숍 참석",
    "자기 점검표(rubric) 기반 자가평가",
    "멘토 교사 피드백 세션",
    "수업 동영상 비교 분석 (이전 vs 현재)",
    "최종 수업 시연 및 종합 평가",
];

/// Trend direction from the regression slope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
}

/// Least-squares fit over an evenly spaced series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendStats {
    pub slope: f64,
    pub direction: TrendDirection,
    pub r_squared: f64,
}

/// Fits `y = slope * x + intercept` over session index
///
/// Fewer than two points is a flat trend by definition.
pub fn linear_trend(values: &[f64]) -> TrendStats {
    let n = values.len();
    if n < 2 {
        return TrendStats {
            slope: 0.0,
            direction: TrendDirection::Stable,
            r_squared: 0.0,
        };
    }

    let x_mean = (n as f64 - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let ss_xy: f64 = values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64 - x_mean) * (v - y_mean))
        .sum();
    let ss_xx: f64 = (0..n).map(|i| (i as f64 - x_mean).powi(2)).sum();
    let ss_yy: f64 = values.iter().map(|v| (v - y_mean).powi(2)).sum();

    let slope = if ss_xx > 0.0 { ss_xy / ss_xx } else { 0.0 };
    let r_squared = if ss_xx > 0.0 && ss_yy > 0.0 {
        (ss_xy * ss_xy) / (ss_xx * ss_yy)
    } else {
        0.0
    };

    let direction = if slope > 0.5 {
        TrendDirection::Improving
    } else if slope < -0.5 {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };

    TrendStats {
        slope,
        direction,
        r_squared,
    }
}

/// Trend of one dimension's percentage over sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionTrend {
    pub stats: TrendStats,
    pub first: f64,
    pub latest: f64,
    pub change: f64,
}

/// Strength and weakness profile from the latest session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthProfile {
    /// Labels at 80% or better in the latest session
    pub strengths: Vec<String>,
    /// Labels below 60% in the latest session
    pub weaknesses: Vec<String>,
    pub most_improved: Option<String>,
    pub most_declined: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementFeedback {
    pub dimension: String,
    pub tips: Vec<String>,
}

/// One practice week in a roadmap phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekPlan {
    pub week: u32,
    pub focus_dimension: String,
    pub goal: String,
    pub activity: String,
    pub current_score: f64,
    pub target_score: f64,
}

/// One roadmap phase (3, 6 or 12 weeks)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapPhase {
    pub period_weeks: u32,
    pub label: String,
    pub focus: String,
    pub target_dimensions: Vec<String>,
    pub expected_improvement: f64,
    pub weeks: Vec<WeekPlan>,
}

/// Full growth report for one teacher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthReport {
    pub sessions: usize,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_scores: Vec<f64>,
    pub total_trend: TrendStats,
    pub dimension_trends: BTreeMap<String, DimensionTrend>,
    pub profile: GrowthProfile,
    pub improvement_feedback: Vec<ImprovementFeedback>,
    pub roadmap: Vec<RoadmapPhase>,
}

/// Time-series growth analyzer over stored evaluations
pub struct GrowthAnalyzer;

impl GrowthAnalyzer {
    /// Analyze a chronologically ordered history
    pub fn analyze(history: &[ScoreSnapshot]) -> AnalysisResult<GrowthReport> {
        if history.is_empty() {
            return Err(AnalysisError::NotFound(
                "no historical evaluations available".to_string(),
            ));
        }

        let total_scores: Vec<f64> = history.iter().map(|h| h.total_score).collect();

        // Per-dimension percentage series over sessions
        let mut series: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for snapshot in history {
            for rec in &snapshot.dimensions {
                if DimensionId::from_label(&rec.name).is_some() {
                    series
                        .entry(rec.name.clone())
                        .or_default()
                        .push(rec.percentage);
                }
            }
        }

        let mut dimension_trends = BTreeMap::new();
        for (label, values) in &series {
            let first = values.first().copied().unwrap_or(0.0);
            let latest = values.last().copied().unwrap_or(0.0);
            dimension_trends.insert(
                label.clone(),
                DimensionTrend {
                    stats: linear_trend(values),
                    first,
                    latest,
                    change: latest - first,
                },
            );
        }

        let latest_pct: BTreeMap<String, f64> = series
            .iter()
            .filter_map(|(label, values)| values.last().map(|v| (label.clone(), *v)))
            .collect();

        let strengths: Vec<String> = latest_pct
            .iter()
            .filter(|(_, pct)| **pct >= 80.0)
            .map(|(label, _)| label.clone())
            .collect();
        let weaknesses: Vec<String> = latest_pct
            .iter()
            .filter(|(_, pct)| **pct < 60.0)
            .map(|(label, _)| label.clone())
            .collect();

        let most_improved = dimension_trends
            .iter()
            .max_by(|a, b| a.1.change.total_cmp(&b.1.change))
            .filter(|(_, t)| t.change > 0.0)
            .map(|(label, _)| label.clone());
        let most_declined = dimension_trends
            .iter()
            .min_by(|a, b| a.1.change.total_cmp(&b.1.change))
            .filter(|(_, t)| t.change < 0.0)
            .map(|(label, _)| label.clone());

        let improvement_feedback: Vec<ImprovementFeedback> = weaknesses
            .iter()
            .take(3)
            .filter_map(|label| {
                DimensionId::from_label(label).map(|dim| ImprovementFeedback {
                    dimension: label.clone(),
                    tips: improvement_tips(dim)
                        .iter()
                        .take(2)
                        .map(|t| t.to_string())
                        .collect(),
                })
            })
            .collect();

        let roadmap = build_roadmap(&weaknesses, &latest_pct);

        Ok(GrowthReport {
            sessions: history.len(),
            period_start: history[0].created_at,
            period_end: history[history.len() - 1].created_at,
            total_scores: total_scores.clone(),
            total_trend: linear_trend(&total_scores),
            dimension_trends,
            profile: GrowthProfile {
                strengths,
                weaknesses,
                most_improved,
                most_declined,
            },
            improvement_feedback,
            roadmap,
        })
    }
}

/// Builds the 3/6/12 week roadmap, cycling through the weak dimensions
fn build_roadmap(weaknesses: &[String], latest_pct: &BTreeMap<String, f64>) -> Vec<RoadmapPhase> {
    // Without explicit weaknesses, target the three lowest dimensions
    let targets: Vec<String> = if weaknesses.is_empty() {
        let mut sorted: Vec<(&String, &f64)> = latest_pct.iter().collect();
        sorted.sort_by(|a, b| a.1.total_cmp(b.1));
        sorted.into_iter().take(3).map(|(label, _)| label.clone()).collect()
    } else {
        weaknesses.to_vec()
    };
    if targets.is_empty() {
        return Vec::new();
    }

    const PHASES: [(u32, &str, &str, f64); 3] = [
        (3, "기초 역량 강화", "인식 및 습관화", 5.0),
        (6, "심화 적용", "전략적 실천", 12.0),
        (12, "전문성 내면화", "자기 모니터링 & 코칭", 20.0),
    ];

    PHASES
        .iter()
        .map(|(weeks_count, label, focus, boost)| {
            let weeks = (0..*weeks_count)
                .map(|week_idx| {
                    let focus_dim = &targets[week_idx as usize % targets.len()];
                    let current = latest_pct.get(focus_dim).copied().unwrap_or(50.0);
                    let progress_ratio = (week_idx + 1) as f64 / *weeks_count as f64;
                    let target = (current + boost * progress_ratio).min(100.0);

                    let goal = DimensionId::from_label(focus_dim)
                        .map(|dim| {
                            let tips = improvement_tips(dim);
                            tips[week_idx as usize % tips.len()].to_string()
                        })
                        .unwrap_or_else(|| "일반 교수법 개선 연습".to_string());

                    WeekPlan {
                        week: week_idx + 1,
                        focus_dimension: focus_dim.clone(),
                        goal,
                        activity: WEEKLY_ACTIVITIES[week_idx as usize % WEEKLY_ACTIVITIES.len()]
                            .to_string(),
                        current_score: current,
                        target_score: (target * 10.0).round() / 10.0,
                    }
                })
                .collect();

            RoadmapPhase {
                period_weeks: *weeks_count,
                label: label.to_string(),
                focus: focus.to_string(),
                target_dimensions: targets.iter().take(3).cloned().collect(),
                expected_improvement: *boost,
                weeks,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn snapshot(day: u32, total: f64, scale: f64) -> ScoreSnapshot {
        let dimensions = DimensionId::ALL
            .iter()
            .map(|d| crate::db::DimensionRecord {
                name: d.label().to_string(),
                score: d.max_score() * scale,
                max_score: d.max_score(),
                percentage: scale * 100.0,
                grade: crate::models::GradeBand::from_ratio(scale).label().to_string(),
                confidence: 0.5,
            })
            .collect();
        ScoreSnapshot {
            analysis_id: Uuid::new_v4(),
            video_path: format!("kim/week{day}.mp4"),
            created_at: Utc.with_ymd_and_hms(2026, 3, day, 10, 0, 0).single().expect("valid date"),
            total_score: total,
            preset: "default".to_string(),
            version: "0.1.0".to_string(),
            dimensions,
        }
    }

    #[test]
    fn trend_detects_improvement() {
        let stats = linear_trend(&[60.0, 65.0, 70.0, 75.0]);
        assert_eq!(stats.direction, TrendDirection::Improving);
        assert!((stats.slope - 5.0).abs() < 1e-9);
        assert!((stats.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn trend_detects_decline_and_stability() {
        assert_eq!(
            linear_trend(&[80.0, 70.0, 60.0]).direction,
            TrendDirection::Declining
        );
        assert_eq!(
            linear_trend(&[70.0, 70.2, 69.9]).direction,
            TrendDirection::Stable
        );
        assert_eq!(linear_trend(&[70.0]).direction, TrendDirection::Stable);
    }

    #[test]
    fn empty_history_is_an_error() {
        assert!(GrowthAnalyzer::analyze(&[]).is_err());
    }

    #[test]
    fn improving_history_shows_in_report() {
        let history = vec![
            snapshot(1, 55.0, 0.55),
            snapshot(8, 65.0, 0.65),
            snapshot(15, 75.0, 0.75),
        ];
        let report = GrowthAnalyzer::analyze(&history).expect("analyzes");

        assert_eq!(report.sessions, 3);
        assert_eq!(report.total_trend.direction, TrendDirection::Improving);
        assert_eq!(report.dimension_trends.len(), 7);
        for trend in report.dimension_trends.values() {
            assert!(trend.change > 0.0);
        }
        assert!(report.profile.most_improved.is_some());
        assert!(report.profile.most_declined.is_none());
    }

    #[test]
    fn roadmap_has_three_phases_with_rising_targets() {
        let history = vec![snapshot(1, 50.0, 0.5)];
        let report = GrowthAnalyzer::analyze(&history).expect("analyzes");

        assert_eq!(report.roadmap.len(), 3);
        assert_eq!(
            report.roadmap.iter().map(|p| p.period_weeks).collect::<Vec<_>>(),
            vec![3, 6, 12]
        );
        for phase in &report.roadmap {
            assert_eq!(phase.weeks.len(), phase.period_weeks as usize);
            for pair in phase.weeks.windows(2) {
                if pair[0].focus_dimension == pair[1].focus_dimension {
                    assert!(pair[1].target_score >= pair[0].target_score);
                }
            }
            for week in &phase.weeks {
                assert!(week.target_score <= 100.0);
                assert!(!week.goal.is_empty());
                assert!(!week.activity.is_empty());
            }
        }
    }

    #[test]
    fn weak_dimensions_get_feedback_tips() {
        // Everything at 50% makes every dimension a weakness
        let history = vec![snapshot(1, 50.0, 0.5)];
        let report = GrowthAnalyzer::analyze(&history).expect("analyzes");

        assert!(!report.improvement_feedback.is_empty());
        assert!(report.improvement_feedback.len() <= 3);
        for fb in &report.improvement_feedback {
            assert_eq!(fb.tips.len(), 2);
        }
    }
}
