//! Progress event types for the assessment pipelines
//!
//! Every asynchronous generation job reports its life cycle as an ordered
//! sequence of [`ProgressEvent`] values. Observers receive the sequence over
//! SSE and treat the first `done` or `error` step as terminal.

use serde::{Deserialize, Serialize};

/// Pipeline steps across both generation pipelines (matrix and diagram).
///
/// Matrix generation walks `extracting → building_graph → classifying →
/// scoring → deduplicating → persisting → done`; diagram synthesis walks
/// `loading → generating_diagram → persisting → done`. `error` is the
/// terminal step for any failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Extracting,
    BuildingGraph,
    Classifying,
    Scoring,
    Deduplicating,
    Persisting,
    Loading,
    GeneratingDiagram,
    Done,
    Error,
}

/// One unit of a job's progress log.
///
/// `progress` is a percentage in `[0, 100]`, or `-1` as the error sentinel
/// so stream consumers can detect failure without polling job status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub step: PipelineStep,
    pub message: String,
    pub progress: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProgressEvent {
    pub fn new(step: PipelineStep, message: impl Into<String>, progress: i32) -> Self {
        Self {
            step,
            message: message.into(),
            progress,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Terminal error event (progress sentinel `-1`)
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(PipelineStep::Error, message, -1)
    }

    /// Whether this event ends the stream from an observer's perspective
    pub fn is_terminal(&self) -> bool {
        matches!(self.step, PipelineStep::Done | PipelineStep::Error)
    }
}

/// Job life cycle status. Transitions are monotonic: `running` moves to
/// exactly one of `done` or `error` and never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Done,
    Error,
}
