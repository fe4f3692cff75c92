//! Pipeline collaborator traits and built-in implementations
//!
//! The orchestrator drives one extractor, four analyzer agents and one
//! discourse analyzer. Implementations are chosen at build time; there
//! is no runtime plugin loading.

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{
    BloomLevels, ContentSummary, DiscourseResult, ExtractedResources, FeedbackQuality,
    QuestionTypes, SttResult, VibeSummary, VisionSummary,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Stable identifiers for pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentId {
    Extract,
    Vision,
    Stt,
    Content,
    Vibe,
    Discourse,
    Pedagogy,
    Feedback,
}

impl AgentId {
    pub const ANALYZERS: [AgentId; 4] =
        [AgentId::Vision, AgentId::Stt, AgentId::Content, AgentId::Vibe];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Extract => "extract",
            AgentId::Vision => "vision",
            AgentId::Stt => "stt",
            AgentId::Content => "content",
            AgentId::Vibe => "vibe",
            AgentId::Discourse => "discourse",
            AgentId::Pedagogy => "pedagogy",
            AgentId::Feedback => "feedback",
        }
    }
}

/// Output of one analyzer agent
#[derive(Debug, Clone)]
pub enum AgentOutput {
    Vision(VisionSummary),
    Stt(SttResult),
    Content(ContentSummary),
    Vibe(VibeSummary),
}

/// Turns the source video into the media resources analyzers consume
#[async_trait]
pub trait ResourceExtractor: Send + Sync {
    async fn extract(&self, video_path: &Path) -> AnalysisResult<ExtractedResources>;
}

/// One of the four parallel analysis agents
#[async_trait]
pub trait AnalyzerAgent: Send + Sync {
    fn id(&self) -> AgentId;
    async fn analyze(&self, resources: &ExtractedResources) -> AnalysisResult<AgentOutput>;
}

/// Derives classroom discourse features from the transcript
pub trait DiscourseAnalyzer: Send + Sync {
    fn analyze(&self, stt: &SttResult) -> AnalysisResult<DiscourseResult>;
}

/// Extractor that checks the file exists but defers media decoding to
/// the analyzers
pub struct FileProbeExtractor;

#[async_trait]
impl ResourceExtractor for FileProbeExtractor {
    async fn extract(&self, video_path: &Path) -> AnalysisResult<ExtractedResources> {
        let metadata = tokio::fs::metadata(video_path).await.map_err(|e| {
            AnalysisError::stage("extract", format!("{}: {}", video_path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(AnalysisError::stage(
                "extract",
                format!("{} is not a file", video_path.display()),
            ));
        }
        Ok(ExtractedResources {
            audio_path: Some(video_path.to_path_buf()),
            frames_dir: None,
            frame_count: 0,
            duration_seconds: 0.0,
        })
    }
}

/// Agent that serves a pre-computed summary
///
/// Upstream media models run out of process; their JSON summaries are
/// fed back through this agent so the rest of the pipeline (events,
/// discourse, scoring, persistence) behaves exactly as in a live run.
pub struct PrecomputedAgent {
    id: AgentId,
    output: Option<AgentOutput>,
}

impl PrecomputedAgent {
    pub fn new(id: AgentId, output: Option<AgentOutput>) -> Self {
        Self { id, output }
    }
}

#[async_trait]
impl AnalyzerAgent for PrecomputedAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    async fn analyze(&self, _resources: &ExtractedResources) -> AnalysisResult<AgentOutput> {
        self.output.clone().ok_or_else(|| {
            AnalysisError::stage(self.id.as_str(), "no precomputed summary provided")
        })
    }
}

/// Discourse features estimated from transcript statistics alone
///
/// A transcript-level stand-in for the LLM discourse pass: question
/// counts are split by fixed proportions and the interaction score is
/// driven by student turns and question density.
pub struct TranscriptDiscourseAnalyzer;

impl DiscourseAnalyzer for TranscriptDiscourseAnalyzer {
    fn analyze(&self, stt: &SttResult) -> AnalysisResult<DiscourseResult> {
        if stt.duration_seconds <= 0.0 {
            return Err(AnalysisError::InvalidInput(
                "transcript has non-positive duration".to_string(),
            ));
        }

        let qc = stt.question_count;
        let question_types = QuestionTypes {
            open_ended: (qc / 3) as u32,
            closed: (qc - qc / 3 - qc / 5) as u32,
            scaffolding: (qc / 5) as u32,
            rhetorical: 0,
        };

        let feedback_quality = FeedbackQuality {
            specific_praise: (stt.interaction_count / 4) as u32,
            corrective: (stt.interaction_count / 6) as u32,
            generic: (stt.interaction_count
                - stt.interaction_count / 4
                - stt.interaction_count / 6) as u32,
        };

        // Question density shifts mass out of pure recall
        let minutes = stt.duration_seconds / 60.0;
        let questions_per_minute = qc as f64 / minutes;
        let shift = (questions_per_minute / 4.0).min(0.5);
        let bloom_levels = BloomLevels {
            remember: 0.7 - shift,
            understand: 0.2,
            apply: 0.1,
            analyze: shift * 0.5,
            evaluate: shift * 0.3,
            create: shift * 0.2,
        };

        let turn_score = (stt.student_turns as f64 * 4.0).min(60.0);
        let question_score = (questions_per_minute * 15.0).min(30.0);
        let balance_score = if stt.teacher_ratio < 0.8 { 10.0 } else { 0.0 };
        let interaction_score = (turn_score + question_score + balance_score).min(100.0);

        Ok(DiscourseResult {
            question_types,
            feedback_quality,
            bloom_levels,
            interaction_score,
        })
    }
}
