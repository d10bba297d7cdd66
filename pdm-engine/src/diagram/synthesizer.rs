//! AI-assisted diagram synthesis from risk-scored matrix rows
//!
//! Best-effort path: one generation call produces Mermaid source plus
//! summary statistics and categorized flow lists. The deterministic
//! converter in [`super::mermaid`] is the reproducible alternative.

use crate::db;
use crate::db::dfd::DfdArtifact;
use crate::genai::{GenerationClient, GenerationError, DEFAULT_MAX_RETRIES};
use crate::models::{DiagramSynthesis, MatrixRow};
use crate::pipeline::prompts::diagram_synthesis_prompt;
use crate::pipeline::{PipelineError, ProgressSink};
use pdm_common::events::{PipelineStep, ProgressEvent};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

const SYNTHESIS_TEMPERATURE: f32 = 0.2;

/// Result summary returned by a completed diagram synthesis
#[derive(Debug, Clone, Serialize)]
pub struct DfdSummary {
    pub node_count: u32,
    pub edge_count: u32,
}

/// Compact per-row view handed to the generation call
#[derive(Serialize)]
struct RowSummary<'a> {
    data_element: &'a str,
    category: &'a crate::models::DataCategory,
    data_subjects: &'a [String],
    source: &'a str,
    collection_method: &'a str,
    purpose: &'a str,
    systems: &'a [String],
    storage_location: &'a str,
    encryption_at_rest: &'a crate::models::EncryptionStatus,
    encryption_in_transit: &'a crate::models::EncryptionStatus,
    recipients_internal: &'a [String],
    recipients_external: &'a [String],
    cross_border: bool,
    risk_score: u8,
    retention: Option<&'a str>,
    gaps: &'a [String],
}

impl<'a> RowSummary<'a> {
    fn from_row(row: &'a MatrixRow) -> Self {
        let el = &row.element;
        Self {
            data_element: &el.data_element_name,
            category: &el.data_category,
            data_subjects: &el.data_subjects,
            source: &el.source_of_data,
            collection_method: &el.collection_method,
            purpose: &el.purpose_of_processing,
            systems: &el.systems_applications,
            storage_location: &el.storage_location,
            encryption_at_rest: &el.encryption_at_rest,
            encryption_in_transit: &el.encryption_in_transit,
            recipients_internal: &el.data_recipients_internal,
            recipients_external: &el.data_recipients_external,
            cross_border: el.cross_border_transfer,
            risk_score: row.risk.final_score,
            retention: el.retention_period.as_deref(),
            gaps: &el.gaps_flagged,
        }
    }
}

/// Diagram synthesis orchestrator
pub struct DfdGenerator {
    db: SqlitePool,
    client: Arc<GenerationClient>,
}

impl DfdGenerator {
    pub fn new(db: SqlitePool, client: Arc<GenerationClient>) -> Self {
        Self { db, client }
    }

    /// Synthesize and persist the diagram for a vertical.
    ///
    /// Fails fast with a precondition error when no matrix rows exist -
    /// the matrix must be generated first.
    pub async fn generate(
        &self,
        vertical_id: Uuid,
        on_progress: ProgressSink<'_>,
    ) -> Result<DfdSummary, PipelineError> {
        let emit = |step: PipelineStep, message: String, progress: i32| {
            on_progress(ProgressEvent::new(step, message, progress));
        };

        // ── Step 1: Load vertical + matrix rows ──
        emit(
            PipelineStep::Loading,
            "Loading data matrix rows...".to_string(),
            5,
        );

        let vertical = db::verticals::load_vertical(&self.db, vertical_id)
            .await?
            .ok_or_else(|| PipelineError::Precondition("Vertical not found".to_string()))?;

        let rows = db::matrix::load_matrix_rows(&self.db, vertical_id).await?;
        if rows.is_empty() {
            return Err(PipelineError::Precondition(
                "No data matrix rows found. Generate the Data Matrix first.".to_string(),
            ));
        }

        emit(
            PipelineStep::Loading,
            format!("Loaded {} data matrix rows", rows.len()),
            15,
        );

        // ── Step 2: Prepare compact matrix summary ──
        emit(
            PipelineStep::GeneratingDiagram,
            "Preparing data for diagram generation...".to_string(),
            20,
        );

        let summary: Vec<RowSummary> = rows.iter().map(RowSummary::from_row).collect();
        let matrix_json = serde_json::to_string_pretty(&summary).map_err(|e| {
            GenerationError::Validation(format!("Failed to serialize matrix summary: {}", e))
        })?;

        // ── Step 3: Generation call ──
        emit(
            PipelineStep::GeneratingDiagram,
            "Generating Mermaid DFD...".to_string(),
            30,
        );

        let prompt = diagram_synthesis_prompt(&matrix_json, &vertical.name, &vertical.industry);
        let result: DiagramSynthesis = self
            .client
            .call(&prompt, SYNTHESIS_TEMPERATURE, DEFAULT_MAX_RETRIES)
            .await?;

        emit(
            PipelineStep::GeneratingDiagram,
            format!(
                "Mermaid DFD generated: {} nodes, {} edges",
                result.node_count, result.edge_count
            ),
            70,
        );

        // ── Step 4: Persist ──
        emit(
            PipelineStep::Persisting,
            "Saving DFD to database...".to_string(),
            75,
        );

        let artifact = DfdArtifact {
            vertical_id,
            source: "ai".to_string(),
            mermaid_code: result.mermaid_code,
            summary: Some(result.summary),
            node_count: result.node_count,
            edge_count: result.edge_count,
            high_risk_flows: result.high_risk_flows,
            cross_border_flows: result.cross_border_flows,
            unencrypted_flows: result.unencrypted_flows,
            generated_at: chrono::Utc::now().to_rfc3339(),
        };
        db::dfd::replace_dfd(&self.db, &artifact).await?;

        emit(PipelineStep::Persisting, "Saving complete".to_string(), 90);

        db::verticals::update_assessment_status(&self.db, vertical_id, "dfd_generated").await?;

        emit(
            PipelineStep::Done,
            format!(
                "DFD generated: {} nodes, {} edges",
                artifact.node_count, artifact.edge_count
            ),
            100,
        );

        tracing::info!(
            vertical_id = %vertical_id,
            nodes = artifact.node_count,
            edges = artifact.edge_count,
            "Diagram synthesis complete"
        );

        Ok(DfdSummary {
            node_count: artifact.node_count,
            edge_count: artifact.edge_count,
        })
    }
}
