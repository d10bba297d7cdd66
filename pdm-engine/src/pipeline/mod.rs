//! Matrix generation pipeline
//!
//! The orchestrator drives the six stages sequentially: entity extraction
//! (bounded fan-out), relationship graph, classification, deterministic
//! risk scoring, deduplication, and transactional persistence. Progress
//! events are emitted at every transition in pipeline order; percentages
//! are monotonically non-decreasing except for the error sentinel.

pub mod classification;
pub mod dedup;
pub mod entity_extraction;
pub mod prompts;
pub mod relationship_graph;
pub mod risk_scoring;
pub mod schema_synthesis;

use crate::db;
use crate::db::matrix::GenerationMetadata;
use crate::genai::{GenerationClient, GenerationError};
use crate::models::ScoredElement;
use pdm_common::events::{PipelineStep, ProgressEvent};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Pipeline failure taxonomy.
///
/// Preconditions fail fast and are never retried - retrying cannot change
/// missing input. Generation errors carry their own retry history.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Common(#[from] pdm_common::Error),
}

/// Result summary returned by a completed matrix generation
#[derive(Debug, Clone, Serialize)]
pub struct MatrixSummary {
    pub row_count: usize,
    pub avg_confidence: f64,
}

/// Progress callback used by both pipelines
pub type ProgressSink<'a> = &'a (dyn Fn(ProgressEvent) + Send + Sync);

/// Full matrix generation orchestrator.
/// Steps: extract → graph → classify → score → dedup → persist
pub struct MatrixGenerator {
    db: SqlitePool,
    client: Arc<GenerationClient>,
}

impl MatrixGenerator {
    pub fn new(db: SqlitePool, client: Arc<GenerationClient>) -> Self {
        Self { db, client }
    }

    /// Run the pipeline for one vertical.
    ///
    /// Fails fast with a precondition error before any generation call
    /// when the vertical is missing or has no finalized sessions.
    pub async fn generate(
        &self,
        vertical_id: Uuid,
        on_progress: ProgressSink<'_>,
    ) -> Result<MatrixSummary, PipelineError> {
        let emit = |step: PipelineStep, message: String, progress: i32| {
            on_progress(ProgressEvent::new(step, message, progress));
        };

        let vertical = db::verticals::load_vertical(&self.db, vertical_id)
            .await?
            .ok_or_else(|| PipelineError::Precondition("Vertical not found".to_string()))?;

        let sessions = db::sessions::load_finalized_sessions(&self.db, vertical_id).await?;
        if sessions.is_empty() {
            return Err(PipelineError::Precondition(
                "No finalized sessions found. Please finalize at least one session.".to_string(),
            ));
        }

        tracing::info!(
            vertical_id = %vertical_id,
            vertical = %vertical.name,
            sessions = sessions.len(),
            "Starting matrix generation pipeline"
        );

        // ── Stage 1: Entity Extraction ──
        emit(
            PipelineStep::Extracting,
            "Extracting privacy entities from sessions...".to_string(),
            5,
        );

        let extraction_results = entity_extraction::extract_entities_batch(
            &self.client,
            &sessions,
            &vertical.name,
            |completed, total| {
                let pct = 5 + ((completed as f64 / total as f64) * 25.0).round() as i32;
                on_progress(ProgressEvent::new(
                    PipelineStep::Extracting,
                    format!("Extracting entities... ({}/{} sessions)", completed, total),
                    pct,
                ));
            },
        )
        .await?;

        let total_entities: usize = extraction_results.iter().map(|r| r.entities.len()).sum();
        emit(
            PipelineStep::Extracting,
            format!(
                "Extracted {} entities from {} sessions",
                total_entities,
                sessions.len()
            ),
            30,
        );

        tracing::info!(
            vertical_id = %vertical_id,
            entities = total_entities,
            "Stage 1 complete: entity extraction"
        );

        // ── Stage 2: Relationship Graph ──
        emit(
            PipelineStep::BuildingGraph,
            "Constructing relationship graph...".to_string(),
            35,
        );

        let graph = relationship_graph::build_relationship_graph(
            &self.client,
            &extraction_results,
            &vertical.name,
        )
        .await?;
        emit(
            PipelineStep::BuildingGraph,
            format!("Built graph with {} data elements", graph.data_elements.len()),
            50,
        );

        tracing::info!(
            vertical_id = %vertical_id,
            data_elements = graph.data_elements.len(),
            "Stage 2 complete: relationship graph"
        );

        // ── Stage 3: Classification ──
        emit(
            PipelineStep::Classifying,
            "Classifying and enriching data elements...".to_string(),
            55,
        );

        let classification = classification::classify_elements(
            &self.client,
            &graph,
            &vertical.industry,
            &vertical.regulatory_scope,
        )
        .await?;
        emit(
            PipelineStep::Classifying,
            format!("Classified {} elements", classification.elements.len()),
            70,
        );

        // ── Stage 4: Risk Scoring (deterministic) ──
        emit(
            PipelineStep::Scoring,
            "Computing risk scores...".to_string(),
            75,
        );

        let scored: Vec<ScoredElement> = classification
            .elements
            .into_iter()
            .map(|element| {
                let risk = risk_scoring::compute_risk_score(&element);
                ScoredElement { element, risk }
            })
            .collect();
        emit(
            PipelineStep::Scoring,
            format!("Scored {} elements", scored.len()),
            80,
        );

        // ── Stage 5: Deduplication ──
        emit(
            PipelineStep::Deduplicating,
            "Deduplicating data elements...".to_string(),
            82,
        );

        let deduped = dedup::dedupe_elements(scored);
        emit(
            PipelineStep::Deduplicating,
            format!("{} unique data elements after dedup", deduped.len()),
            85,
        );

        // ── Stage 6: Persist ──
        emit(
            PipelineStep::Persisting,
            "Saving to database...".to_string(),
            88,
        );

        let session_ids: Vec<String> = sessions
            .iter()
            .map(|s| s.session_id.to_string())
            .collect();
        let avg_confidence = if deduped.is_empty() {
            0.0
        } else {
            deduped
                .iter()
                .map(|e| e.element.confidence_score)
                .sum::<f64>()
                / deduped.len() as f64
        };
        let metadata = GenerationMetadata {
            total_rows: deduped.len(),
            avg_confidence,
            generated_at: chrono::Utc::now().to_rfc3339(),
            sessions_used: session_ids.clone(),
        };

        db::matrix::replace_matrix_rows(&self.db, vertical_id, &deduped, &session_ids, &metadata)
            .await?;
        db::verticals::update_assessment_status(&self.db, vertical_id, "matrix_generated").await?;

        emit(
            PipelineStep::Done,
            format!("Data Matrix generated: {} rows", deduped.len()),
            100,
        );

        tracing::info!(
            vertical_id = %vertical_id,
            rows = deduped.len(),
            avg_confidence = avg_confidence,
            "Matrix generation pipeline complete"
        );

        Ok(MatrixSummary {
            row_count: deduped.len(),
            avg_confidence,
        })
    }
}
