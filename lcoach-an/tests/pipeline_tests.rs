//! Pipeline Orchestration Tests
//!
//! Full runs over precomputed analyzer summaries, plus the failure
//! isolation paths: a failing agent, a missing transcript, a broken
//! result store and an empty analyzer roster.

use async_trait::async_trait;
use lcoach_an::error::{AnalysisError, AnalysisResult};
use lcoach_an::pipeline::agents::{
    AgentId, AgentOutput, AnalyzerAgent, FileProbeExtractor, PrecomputedAgent,
    TranscriptDiscourseAnalyzer,
};
use lcoach_an::pipeline::{AgentStatus, AnalysisReport, PipelineOrchestrator, ResultStore};
use lcoach_an::scoring::RubricEngine;
use lcoach_an::types::{
    ContentSummary, EnergyDistribution, SttResult, VibeSummary, VisionSummary,
};
use lcoach_common::events::LcoachEvent;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

fn vision() -> VisionSummary {
    VisionSummary {
        gesture_active_ratio: 0.65,
        avg_gesture_score: 0.7,
        eye_contact_ratio: 0.75,
        face_detection_ratio: 0.9,
        avg_expression_score: 72.0,
        avg_body_openness: 0.8,
        avg_motion_score: 28.0,
    }
}

fn stt() -> SttResult {
    SttResult {
        word_count: 1300,
        duration_seconds: 600.0,
        speaking_rate: 130.0,
        filler_ratio: 0.01,
        speaking_pattern: "Conversational".to_string(),
        segment_count: 120,
        student_turns: 15,
        interaction_count: 18,
        teacher_ratio: 0.62,
        question_count: 12,
    }
}

fn content() -> ContentSummary {
    ContentSummary {
        slide_detected_ratio: 0.7,
        speaker_visible_ratio: 0.85,
        avg_color_contrast: 70.0,
        avg_complexity: 14.0,
    }
}

fn vibe() -> VibeSummary {
    VibeSummary {
        avg_silence_ratio: 0.22,
        monotone_ratio: 0.12,
        energy_distribution: EnergyDistribution {
            low: 0.15,
            normal: 0.5,
            high: 0.35,
        },
    }
}

fn full_roster() -> Vec<Arc<dyn AnalyzerAgent>> {
    vec![
        Arc::new(PrecomputedAgent::new(
            AgentId::Vision,
            Some(AgentOutput::Vision(vision())),
        )),
        Arc::new(PrecomputedAgent::new(
            AgentId::Stt,
            Some(AgentOutput::Stt(stt())),
        )),
        Arc::new(PrecomputedAgent::new(
            AgentId::Content,
            Some(AgentOutput::Content(content())),
        )),
        Arc::new(PrecomputedAgent::new(
            AgentId::Vibe,
            Some(AgentOutput::Vibe(vibe())),
        )),
    ]
}

fn orchestrator(
    analyzers: Vec<Arc<dyn AnalyzerAgent>>,
    store: Option<Arc<dyn ResultStore>>,
) -> PipelineOrchestrator {
    PipelineOrchestrator::new(
        Arc::new(FileProbeExtractor),
        analyzers,
        Arc::new(TranscriptDiscourseAnalyzer),
        RubricEngine::with_defaults(),
        store,
    )
}

fn video_file(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("lesson.mp4");
    std::fs::write(&path, b"not a real video").expect("write video");
    path
}

struct FailingStore;

#[async_trait]
impl ResultStore for FailingStore {
    async fn save(&self, _report: &AnalysisReport) -> AnalysisResult<Uuid> {
        Err(AnalysisError::stage("persist", "disk full"))
    }
}

#[tokio::test]
async fn full_run_completes_every_stage() {
    // Given: all four analyzers have summaries and the video exists
    let dir = tempfile::tempdir().expect("temp dir");
    let video = video_file(&dir);
    let orchestrator = orchestrator(full_roster(), None);

    // When: the pipeline runs
    let report = orchestrator.run(&video).await.expect("pipeline succeeds");

    // Then: every stage finished and the rubric was evaluated
    for id in [
        AgentId::Extract,
        AgentId::Vision,
        AgentId::Stt,
        AgentId::Content,
        AgentId::Vibe,
        AgentId::Discourse,
        AgentId::Pedagogy,
        AgentId::Feedback,
    ] {
        let state = &report.agent_states[id.as_str()];
        assert_eq!(state.status, AgentStatus::Done, "stage {}", id.as_str());
    }
    assert!(report.rubric.total_score > 0.0);
    assert!(report.input.discourse.is_available());
    assert!(!report.feedback.headline.is_empty());

    let log = orchestrator.event_log();
    assert!(matches!(log.first(), Some(LcoachEvent::PipelineStarted { .. })));
    assert!(matches!(log.last(), Some(LcoachEvent::PipelineCompleted { .. })));
    assert!(log
        .iter()
        .any(|e| matches!(e, LcoachEvent::EvaluationCompleted { .. })));
}

#[tokio::test]
async fn failing_agent_does_not_sink_the_run() {
    // Given: the vision agent has no summary to serve
    let dir = tempfile::tempdir().expect("temp dir");
    let video = video_file(&dir);
    let mut analyzers = full_roster();
    analyzers[0] = Arc::new(PrecomputedAgent::new(AgentId::Vision, None));
    let orchestrator = orchestrator(analyzers, None);

    // When: the pipeline runs
    let report = orchestrator.run(&video).await.expect("pipeline succeeds");

    // Then: vision is marked failed, everything else completed
    assert_eq!(
        report.agent_states["vision"].status,
        AgentStatus::Error
    );
    assert!(!report.input.vision.is_available());
    assert_eq!(report.agent_states["pedagogy"].status, AgentStatus::Done);
    assert!(report.rubric.total_score > 0.0);

    let log = orchestrator.event_log();
    assert!(log.iter().any(
        |e| matches!(e, LcoachEvent::AgentFailed { agent, .. } if agent == "vision")
    ));
    assert!(matches!(log.last(), Some(LcoachEvent::PipelineCompleted { .. })));
}

#[tokio::test]
async fn each_failed_agent_lands_in_its_own_input_slot() {
    // Given: content and vibe both fail while vision and stt succeed
    let dir = tempfile::tempdir().expect("temp dir");
    let video = video_file(&dir);
    let mut analyzers = full_roster();
    analyzers[2] = Arc::new(PrecomputedAgent::new(AgentId::Content, None));
    analyzers[3] = Arc::new(PrecomputedAgent::new(AgentId::Vibe, None));
    let orchestrator = orchestrator(analyzers, None);

    // When: the pipeline runs
    let report = orchestrator.run(&video).await.expect("pipeline succeeds");

    // Then: each failure is recorded against its own source
    assert!(matches!(
        report.input.content,
        lcoach_an::types::SourceInput::Failed { ref error } if !error.is_empty()
    ));
    assert!(matches!(
        report.input.vibe,
        lcoach_an::types::SourceInput::Failed { ref error } if !error.is_empty()
    ));
    assert!(report.input.vision.is_available());
    assert!(report.input.stt.is_available());
    assert_eq!(report.agent_states["content"].status, AgentStatus::Error);
    assert_eq!(report.agent_states["vibe"].status, AgentStatus::Error);
}

#[tokio::test]
async fn discourse_is_skipped_without_a_transcript() {
    // Given: the stt agent produces nothing
    let dir = tempfile::tempdir().expect("temp dir");
    let video = video_file(&dir);
    let mut analyzers = full_roster();
    analyzers[1] = Arc::new(PrecomputedAgent::new(AgentId::Stt, None));
    let orchestrator = orchestrator(analyzers, None);

    // When: the pipeline runs
    let report = orchestrator.run(&video).await.expect("pipeline succeeds");

    // Then: discourse never ran, and the rubric scored without it
    assert_eq!(
        report.agent_states["discourse"].status,
        AgentStatus::Skipped
    );
    assert!(!report.input.discourse.is_available());

    let log = orchestrator.event_log();
    assert!(log.iter().any(|e| matches!(
        e,
        LcoachEvent::AgentSkipped { agent, reason, .. }
            if agent == "discourse" && reason.contains("transcript")
    )));
}

#[tokio::test]
async fn missing_video_degrades_extraction_only() {
    // Precomputed summaries do not need the media resources, so a
    // missing video costs the extract stage and nothing else.
    let orchestrator = orchestrator(full_roster(), None);
    let report = orchestrator
        .run(&PathBuf::from("/nonexistent/lesson.mp4"))
        .await
        .expect("pipeline succeeds");

    assert_eq!(report.agent_states["extract"].status, AgentStatus::Error);
    assert_eq!(report.agent_states["vision"].status, AgentStatus::Done);
    assert!(report.rubric.total_score > 0.0);
}

#[tokio::test]
async fn broken_store_does_not_cost_the_report() {
    let dir = tempfile::tempdir().expect("temp dir");
    let video = video_file(&dir);
    let orchestrator = orchestrator(full_roster(), Some(Arc::new(FailingStore)));

    let report = orchestrator.run(&video).await.expect("pipeline succeeds");

    assert!(report.rubric.total_score > 0.0);
    let log = orchestrator.event_log();
    assert!(!log
        .iter()
        .any(|e| matches!(e, LcoachEvent::ResultPersisted { .. })));
    assert!(matches!(log.last(), Some(LcoachEvent::PipelineCompleted { .. })));
}

#[tokio::test]
async fn sqlite_store_persists_the_report() {
    let dir = tempfile::tempdir().expect("temp dir");
    let video = video_file(&dir);
    let pool = lcoach_an::db::init_database_pool(&dir.path().join("lcoach.db"))
        .await
        .expect("pool");
    let store = lcoach_an::db::SqliteResultStore::new(pool);
    let orchestrator = orchestrator(full_roster(), Some(Arc::new(store.clone())));

    let report = orchestrator.run(&video).await.expect("pipeline succeeds");

    let log = orchestrator.event_log();
    let analysis_id = log.iter().find_map(|e| match e {
        LcoachEvent::ResultPersisted { analysis_id, .. } => Some(*analysis_id),
        _ => None,
    });
    let analysis_id = analysis_id.expect("persisted event");

    let loaded = store.load(analysis_id).await.expect("load").expect("stored");
    assert_eq!(loaded["pipeline_id"], report.pipeline_id.to_string());
    assert_eq!(loaded["rubric"]["grade"], report.rubric.grade);
}

#[tokio::test]
async fn empty_roster_fails_the_pipeline() {
    let dir = tempfile::tempdir().expect("temp dir");
    let video = video_file(&dir);
    let orchestrator = orchestrator(Vec::new(), None);

    let result = orchestrator.run(&video).await;
    assert!(result.is_err());

    let log = orchestrator.event_log();
    assert!(matches!(log.last(), Some(LcoachEvent::PipelineFailed { .. })));
}

#[tokio::test]
async fn subscribers_see_events_as_they_happen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let video = video_file(&dir);
    let orchestrator = orchestrator(full_roster(), None);
    let mut rx = orchestrator.event_bus().subscribe();

    orchestrator.run(&video).await.expect("pipeline succeeds");

    let first = rx.recv().await.expect("event delivered");
    assert!(matches!(first, LcoachEvent::PipelineStarted { .. }));
}

#[tokio::test]
async fn reset_clears_previous_run_state() {
    let dir = tempfile::tempdir().expect("temp dir");
    let video = video_file(&dir);
    let orchestrator = orchestrator(full_roster(), None);

    orchestrator.run(&video).await.expect("pipeline succeeds");
    assert!(orchestrator.status().event_count > 0);

    orchestrator.reset();
    let status = orchestrator.status();
    assert_eq!(status.event_count, 0);
    assert!(status.agents.is_empty());
    assert!(status.pipeline_id.is_none());
}
