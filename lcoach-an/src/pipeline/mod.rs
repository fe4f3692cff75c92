//! Analysis pipeline orchestration
//!
//! One `run` drives the full flow for a lecture video: resource
//! extraction, four analyzer agents in parallel, transcript discourse
//! analysis, rubric evaluation, feedback synthesis and best-effort
//! persistence. Agent failures are isolated; the rubric is evaluated
//! over whatever evidence survived.

pub mod agents;
pub mod feedback;

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::RubricResult;
use crate::pipeline::agents::{
    AgentId, AgentOutput, AnalyzerAgent, DiscourseAnalyzer, ResourceExtractor,
};
use crate::pipeline::feedback::{FeedbackReport, FeedbackSynthesizer};
use crate::scoring::RubricEngine;
use crate::types::{EvaluationInput, SourceInput};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use lcoach_common::events::{EventBus, LcoachEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use uuid::Uuid;

/// Worker pool size for the parallel analyzer phase
pub const MAX_CONCURRENT_AGENTS: usize = 4;

/// Lifecycle of one pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    Idle,
    Running,
    Done,
    Error,
    Skipped,
}

/// Snapshot of one stage's progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub status: AgentStatus,
    pub elapsed_seconds: f64,
    pub error: Option<String>,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            status: AgentStatus::Idle,
            elapsed_seconds: 0.0,
            error: None,
        }
    }
}

/// Point-in-time view of the pipeline
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatus {
    pub pipeline_id: Option<Uuid>,
    pub agents: BTreeMap<String, AgentState>,
    pub event_count: usize,
}

/// Final output of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub pipeline_id: Uuid,
    pub video_path: String,
    pub input: EvaluationInput,
    pub rubric: RubricResult,
    pub feedback: FeedbackReport,
    pub agent_states: BTreeMap<String, AgentState>,
    pub total_elapsed_seconds: f64,
}

/// Persists finished reports; saving is best-effort
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn save(&self, report: &AnalysisReport) -> AnalysisResult<Uuid>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Drives one lecture video through the full analysis flow
pub struct PipelineOrchestrator {
    extractor: Arc<dyn ResourceExtractor>,
    analyzers: Vec<Arc<dyn AnalyzerAgent>>,
    discourse: Arc<dyn DiscourseAnalyzer>,
    engine: RubricEngine,
    store: Option<Arc<dyn ResultStore>>,
    event_bus: EventBus,
    states: Mutex<BTreeMap<AgentId, AgentState>>,
    event_log: Mutex<Vec<LcoachEvent>>,
    current_pipeline: Mutex<Option<Uuid>>,
}

impl PipelineOrchestrator {
    pub fn new(
        extractor: Arc<dyn ResourceExtractor>,
        analyzers: Vec<Arc<dyn AnalyzerAgent>>,
        discourse: Arc<dyn DiscourseAnalyzer>,
        engine: RubricEngine,
        store: Option<Arc<dyn ResultStore>>,
    ) -> Self {
        Self {
            extractor,
            analyzers,
            discourse,
            engine,
            store,
            event_bus: EventBus::new(256),
            states: Mutex::new(BTreeMap::new()),
            event_log: Mutex::new(Vec::new()),
            current_pipeline: Mutex::new(None),
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Snapshot of agent states and event volume
    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            pipeline_id: *lock(&self.current_pipeline),
            agents: lock(&self.states)
                .iter()
                .map(|(id, state)| (id.as_str().to_string(), state.clone()))
                .collect(),
            event_count: lock(&self.event_log).len(),
        }
    }

    /// Copy of the append-only event log for the current run
    pub fn event_log(&self) -> Vec<LcoachEvent> {
        lock(&self.event_log).clone()
    }

    /// Clears all run state so the orchestrator can be reused
    pub fn reset(&self) {
        lock(&self.states).clear();
        lock(&self.event_log).clear();
        *lock(&self.current_pipeline) = None;
    }

    /// Run the full pipeline for one video
    pub async fn run(&self, video_path: &Path) -> AnalysisResult<AnalysisReport> {
        let pipeline_id = Uuid::new_v4();
        self.reset();
        *lock(&self.current_pipeline) = Some(pipeline_id);

        let started = Instant::now();
        self.record(LcoachEvent::PipelineStarted {
            pipeline_id,
            video_path: video_path.display().to_string(),
            timestamp: Utc::now(),
        });

        match self.run_phases(pipeline_id, video_path, started).await {
            Ok(report) => {
                self.record(LcoachEvent::PipelineCompleted {
                    pipeline_id,
                    total_elapsed_seconds: report.total_elapsed_seconds,
                    timestamp: Utc::now(),
                });
                Ok(report)
            }
            Err(e) => {
                let stage = match &e {
                    AnalysisError::Stage { stage, .. } => stage.clone(),
                    _ => "pipeline".to_string(),
                };
                self.record(LcoachEvent::PipelineFailed {
                    pipeline_id,
                    stage,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e)
            }
        }
    }

    async fn run_phases(
        &self,
        pipeline_id: Uuid,
        video_path: &Path,
        started: Instant,
    ) -> AnalysisResult<AnalysisReport> {
        if self.analyzers.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "no analyzer agents configured".to_string(),
            ));
        }

        // Phase 1: extraction. Failure degrades to empty resources so
        // agents with precomputed summaries can still run.
        self.mark_running(AgentId::Extract, pipeline_id);
        let extract_started = Instant::now();
        let resources = match self.extractor.extract(video_path).await {
            Ok(r) => {
                self.mark_done(AgentId::Extract, pipeline_id, extract_started.elapsed().as_secs_f64());
                r
            }
            Err(e) => {
                tracing::warn!(error = %e, "Extraction failed, continuing with empty resources");
                self.mark_error(
                    AgentId::Extract,
                    pipeline_id,
                    extract_started.elapsed().as_secs_f64(),
                    &e,
                );
                Default::default()
            }
        };

        // Phase 2: the four analyzers, at most MAX_CONCURRENT_AGENTS at
        // once. Each task returns its outcome; merging happens here, on
        // one thread, after all of them finish.
        let outcomes: Vec<(AgentId, AnalysisResult<AgentOutput>, f64)> =
            stream::iter(self.analyzers.iter().cloned())
                .map(|agent| {
                    let resources = &resources;
                    async move {
                        let id = agent.id();
                        self.mark_running(id, pipeline_id);
                        let agent_started = Instant::now();
                        let outcome = agent.analyze(resources).await;
                        (id, outcome, agent_started.elapsed().as_secs_f64())
                    }
                })
                .buffer_unordered(MAX_CONCURRENT_AGENTS)
                .collect()
                .await;

        let mut input = EvaluationInput::default();
        for (id, outcome, elapsed) in outcomes {
            match outcome {
                Ok(output) => {
                    self.mark_done(id, pipeline_id, elapsed);
                    match output {
                        AgentOutput::Vision(v) => input.vision = SourceInput::Available(v),
                        AgentOutput::Stt(s) => input.stt = SourceInput::Available(s),
                        AgentOutput::Content(c) => input.content = SourceInput::Available(c),
                        AgentOutput::Vibe(v) => input.vibe = SourceInput::Available(v),
                    }
                }
                Err(e) => {
                    tracing::warn!(agent = id.as_str(), error = %e, "Analyzer failed");
                    self.mark_error(id, pipeline_id, elapsed, &e);
                    let error = e.to_string();
                    match id {
                        AgentId::Vision => input.vision = SourceInput::Failed { error },
                        AgentId::Stt => input.stt = SourceInput::Failed { error },
                        AgentId::Content => input.content = SourceInput::Failed { error },
                        AgentId::Vibe => input.vibe = SourceInput::Failed { error },
                        _ => {}
                    }
                }
            }
        }

        // Phase 3: discourse depends on the transcript
        match input.stt.value().cloned() {
            Some(stt) => {
                self.mark_running(AgentId::Discourse, pipeline_id);
                let discourse_started = Instant::now();
                match self.discourse.analyze(&stt) {
                    Ok(result) => {
                        self.mark_done(
                            AgentId::Discourse,
                            pipeline_id,
                            discourse_started.elapsed().as_secs_f64(),
                        );
                        input.discourse = SourceInput::Available(result);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Discourse analysis failed");
                        self.mark_error(
                            AgentId::Discourse,
                            pipeline_id,
                            discourse_started.elapsed().as_secs_f64(),
                            &e,
                        );
                        input.discourse = SourceInput::Failed {
                            error: e.to_string(),
                        };
                    }
                }
            }
            None => {
                self.mark_skipped(AgentId::Discourse, pipeline_id, "transcript unavailable");
            }
        }

        // Phase 4: rubric evaluation
        self.mark_running(AgentId::Pedagogy, pipeline_id);
        let scoring_started = Instant::now();
        let rubric = self.engine.evaluate(&input);
        self.mark_done(
            AgentId::Pedagogy,
            pipeline_id,
            scoring_started.elapsed().as_secs_f64(),
        );
        self.record(LcoachEvent::EvaluationCompleted {
            pipeline_id,
            total_score: rubric.total_score,
            grade: rubric.grade.clone(),
            overall_confidence: rubric.confidence.overall_confidence,
            timestamp: Utc::now(),
        });

        // Phase 5: feedback synthesis
        self.mark_running(AgentId::Feedback, pipeline_id);
        let feedback_started = Instant::now();
        let feedback = FeedbackSynthesizer::synthesize(&rubric, &input);
        self.mark_done(
            AgentId::Feedback,
            pipeline_id,
            feedback_started.elapsed().as_secs_f64(),
        );

        let report = AnalysisReport {
            pipeline_id,
            video_path: video_path.display().to_string(),
            input,
            rubric,
            feedback,
            agent_states: lock(&self.states)
                .iter()
                .map(|(id, state)| (id.as_str().to_string(), state.clone()))
                .collect(),
            total_elapsed_seconds: started.elapsed().as_secs_f64(),
        };

        // Phase 6: persistence is best-effort; a storage outage never
        // costs the caller their report.
        if let Some(store) = &self.store {
            match store.save(&report).await {
                Ok(analysis_id) => {
                    self.record(LcoachEvent::ResultPersisted {
                        pipeline_id,
                        analysis_id,
                        timestamp: Utc::now(),
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Result persistence failed, continuing");
                }
            }
        }

        Ok(report)
    }

    fn record(&self, event: LcoachEvent) {
        lock(&self.event_log).push(event.clone());
        self.event_bus.emit_lossy(event);
    }

    fn mark_running(&self, id: AgentId, pipeline_id: Uuid) {
        lock(&self.states).insert(
            id,
            AgentState {
                status: AgentStatus::Running,
                elapsed_seconds: 0.0,
                error: None,
            },
        );
        self.record(LcoachEvent::AgentStarted {
            pipeline_id,
            agent: id.as_str().to_string(),
            timestamp: Utc::now(),
        });
    }

    fn mark_done(&self, id: AgentId, pipeline_id: Uuid, elapsed_seconds: f64) {
        lock(&self.states).insert(
            id,
            AgentState {
                status: AgentStatus::Done,
                elapsed_seconds,
                error: None,
            },
        );
        self.record(LcoachEvent::AgentCompleted {
            pipeline_id,
            agent: id.as_str().to_string(),
            elapsed_seconds,
            timestamp: Utc::now(),
        });
    }

    fn mark_error(&self, id: AgentId, pipeline_id: Uuid, elapsed_seconds: f64, error: &AnalysisError) {
        lock(&self.states).insert(
            id,
            AgentState {
                status: AgentStatus::Error,
                elapsed_seconds,
                error: Some(error.to_string()),
            },
        );
        self.record(LcoachEvent::AgentFailed {
            pipeline_id,
            agent: id.as_str().to_string(),
            error: error.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn mark_skipped(&self, id: AgentId, pipeline_id: Uuid, reason: &str) {
        lock(&self.states).insert(
            id,
            AgentState {
                status: AgentStatus::Skipped,
                elapsed_seconds: 0.0,
                error: None,
            },
        );
        self.record(LcoachEvent::AgentSkipped {
            pipeline_id,
            agent: id.as_str().to_string(),
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });
    }
}
