//! Event types for the LCOACH event system
//!
//! Provides shared event definitions and the `EventBus` used by the
//! analysis pipeline to broadcast lifecycle transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// LCOACH pipeline events
///
/// Events are broadcast via `EventBus` and can be serialized for
/// transmission to status consumers. Every agent state transition in the
/// analysis pipeline produces exactly one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LcoachEvent {
    /// Analysis pipeline run started
    PipelineStarted {
        pipeline_id: Uuid,
        video_path: String,
        timestamp: DateTime<Utc>,
    },

    /// An agent was dispatched
    AgentStarted {
        pipeline_id: Uuid,
        agent: String,
        timestamp: DateTime<Utc>,
    },

    /// An agent completed successfully
    AgentCompleted {
        pipeline_id: Uuid,
        agent: String,
        elapsed_seconds: f64,
        timestamp: DateTime<Utc>,
    },

    /// An agent failed; the failure is isolated to that agent
    AgentFailed {
        pipeline_id: Uuid,
        agent: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// An agent was skipped because a dependency produced no output
    AgentSkipped {
        pipeline_id: Uuid,
        agent: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Rubric evaluation finished (supplementary total + grade)
    EvaluationCompleted {
        pipeline_id: Uuid,
        total_score: f64,
        grade: String,
        overall_confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// Full pipeline run completed
    PipelineCompleted {
        pipeline_id: Uuid,
        total_elapsed_seconds: f64,
        timestamp: DateTime<Utc>,
    },

    /// Pipeline run failed with an unrecoverable error
    PipelineFailed {
        pipeline_id: Uuid,
        stage: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// Analysis result persisted to the result store (best-effort)
    ResultPersisted {
        pipeline_id: Uuid,
        analysis_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl LcoachEvent {
    /// Event type name as transmitted in the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            LcoachEvent::PipelineStarted { .. } => "PipelineStarted",
            LcoachEvent::AgentStarted { .. } => "AgentStarted",
            LcoachEvent::AgentCompleted { .. } => "AgentCompleted",
            LcoachEvent::AgentFailed { .. } => "AgentFailed",
            LcoachEvent::AgentSkipped { .. } => "AgentSkipped",
            LcoachEvent::EvaluationCompleted { .. } => "EvaluationCompleted",
            LcoachEvent::PipelineCompleted { .. } => "PipelineCompleted",
            LcoachEvent::PipelineFailed { .. } => "PipelineFailed",
            LcoachEvent::ResultPersisted { .. } => "ResultPersisted",
        }
    }

    /// Name of the agent the event refers to, if any
    pub fn agent(&self) -> Option<&str> {
        match self {
            LcoachEvent::AgentStarted { agent, .. }
            | LcoachEvent::AgentCompleted { agent, .. }
            | LcoachEvent::AgentFailed { agent, .. }
            | LcoachEvent::AgentSkipped { agent, .. } => Some(agent),
            _ => None,
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for pipeline events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the pipeline)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LcoachEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<LcoachEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: LcoachEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<LcoachEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Pipeline progress must never depend on a consumer being attached,
    /// so the orchestrator emits everything through this method.
    pub fn emit_lossy(&self, event: LcoachEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
