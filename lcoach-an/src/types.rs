//! Shared data types for the analysis pipeline and rubric engine
//!
//! Each upstream analyzer produces a typed summary. Availability is
//! modeled explicitly with `SourceInput` so downstream scoring can
//! distinguish "never ran" from "ran and failed" without sentinel values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Availability of one analyzer's output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", content = "data")]
pub enum SourceInput<T> {
    /// Analyzer produced a summary
    Available(T),
    /// Analyzer never ran or was not requested
    Missing,
    /// Analyzer ran and failed
    Failed { error: String },
}

impl<T> SourceInput<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, SourceInput::Available(_))
    }

    /// The summary, if one exists
    pub fn value(&self) -> Option<&T> {
        match self {
            SourceInput::Available(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> Default for SourceInput<T> {
    fn default() -> Self {
        SourceInput::Missing
    }
}

impl<T> From<Option<T>> for SourceInput<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => SourceInput::Available(v),
            None => SourceInput::Missing,
        }
    }
}

/// Body language and camera presence summary from video frames
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionSummary {
    /// Fraction of frames with active gesturing (0.0..=1.0)
    pub gesture_active_ratio: f64,
    pub avg_gesture_score: f64,
    /// Fraction of frames with camera-directed gaze (0.0..=1.0)
    pub eye_contact_ratio: f64,
    pub face_detection_ratio: f64,
    /// Positive expression score (0..=100)
    pub avg_expression_score: f64,
    pub avg_body_openness: f64,
    pub avg_motion_score: f64,
}

/// Transcript statistics from speech-to-text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttResult {
    pub word_count: u64,
    pub duration_seconds: f64,
    /// Words per minute
    pub speaking_rate: f64,
    pub filler_ratio: f64,
    pub speaking_pattern: String,
    pub segment_count: u64,
    pub student_turns: u64,
    pub interaction_count: u64,
    /// Fraction of speech time held by the teacher (0.0..=1.0)
    pub teacher_ratio: f64,
    pub question_count: u64,
}

/// Slide and board content summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSummary {
    pub slide_detected_ratio: f64,
    pub speaker_visible_ratio: f64,
    pub avg_color_contrast: f64,
    pub avg_complexity: f64,
}

/// Distribution of vocal energy over the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyDistribution {
    pub low: f64,
    pub normal: f64,
    pub high: f64,
}

/// Prosody and classroom atmosphere summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VibeSummary {
    pub avg_silence_ratio: f64,
    pub monotone_ratio: f64,
    pub energy_distribution: EnergyDistribution,
}

/// Question type counts in the transcript
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionTypes {
    pub open_ended: u32,
    pub closed: u32,
    pub scaffolding: u32,
    pub rhetorical: u32,
}

/// Teacher feedback utterance counts by quality
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackQuality {
    pub specific_praise: u32,
    pub corrective: u32,
    pub generic: u32,
}

/// Bloom taxonomy level shares, each 0.0..=1.0
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BloomLevels {
    pub remember: f64,
    pub understand: f64,
    pub apply: f64,
    pub analyze: f64,
    pub evaluate: f64,
    pub create: f64,
}

impl BloomLevels {
    /// Combined share of the upper taxonomy levels
    pub fn upper(&self) -> f64 {
        self.analyze + self.evaluate + self.create
    }
}

/// Classroom discourse analysis over the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscourseResult {
    pub question_types: QuestionTypes,
    pub feedback_quality: FeedbackQuality,
    pub bloom_levels: BloomLevels,
    /// Overall interaction quality (0..=100)
    pub interaction_score: f64,
}

/// The five upstream evidence sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceKind {
    Vision,
    Stt,
    Content,
    Vibe,
    Discourse,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Vision,
        SourceKind::Stt,
        SourceKind::Content,
        SourceKind::Vibe,
        SourceKind::Discourse,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Vision => "vision",
            SourceKind::Stt => "stt",
            SourceKind::Content => "content",
            SourceKind::Vibe => "vibe",
            SourceKind::Discourse => "discourse",
        }
    }
}

/// Everything the rubric engine consumes for one evaluation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationInput {
    pub vision: SourceInput<VisionSummary>,
    pub stt: SourceInput<SttResult>,
    pub content: SourceInput<ContentSummary>,
    pub vibe: SourceInput<VibeSummary>,
    pub discourse: SourceInput<DiscourseResult>,
}

impl EvaluationInput {
    /// Number of sources that produced a summary (0..=5)
    pub fn available_count(&self) -> usize {
        [
            self.vision.is_available(),
            self.stt.is_available(),
            self.content.is_available(),
            self.vibe.is_available(),
            self.discourse.is_available(),
        ]
        .iter()
        .filter(|a| **a)
        .count()
    }

    pub fn is_source_available(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Vision => self.vision.is_available(),
            SourceKind::Stt => self.stt.is_available(),
            SourceKind::Content => self.content.is_available(),
            SourceKind::Vibe => self.vibe.is_available(),
            SourceKind::Discourse => self.discourse.is_available(),
        }
    }

    /// Names of sources that produced a summary, in canonical order
    pub fn available_source_names(&self) -> Vec<String> {
        SourceKind::ALL
            .iter()
            .filter(|k| self.is_source_available(**k))
            .map(|k| k.name().to_string())
            .collect()
    }
}

/// Plain JSON bundle of optional analyzer summaries
///
/// The CLI accepts this shape directly; absent fields become
/// `SourceInput::Missing`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryBundle {
    #[serde(default)]
    pub vision: Option<VisionSummary>,
    #[serde(default)]
    pub stt: Option<SttResult>,
    #[serde(default)]
    pub content: Option<ContentSummary>,
    #[serde(default)]
    pub vibe: Option<VibeSummary>,
    #[serde(default)]
    pub discourse: Option<DiscourseResult>,
}

impl From<SummaryBundle> for EvaluationInput {
    fn from(bundle: SummaryBundle) -> Self {
        EvaluationInput {
            vision: bundle.vision.into(),
            stt: bundle.stt.into(),
            content: bundle.content.into(),
            vibe: bundle.vibe.into(),
            discourse: bundle.discourse.into(),
        }
    }
}

/// Media resources produced by the extraction phase
#[derive(Debug, Clone, Default)]
pub struct ExtractedResources {
    pub audio_path: Option<PathBuf>,
    pub frames_dir: Option<PathBuf>,
    pub frame_count: usize,
    pub duration_seconds: f64,
}
