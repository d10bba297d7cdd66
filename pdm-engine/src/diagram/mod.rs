//! Diagram compilers
//!
//! Two independent paths produce a Mermaid DFD for a vertical:
//! - a deterministic structured-schema converter ([`mermaid`])
//! - an AI-assisted synthesizer from risk-scored matrix rows
//!   ([`synthesizer`])

pub mod mermaid;
pub mod synthesizer;

pub use mermaid::to_mermaid;
pub use synthesizer::{DfdGenerator, DfdSummary};

use crate::db;
use crate::db::dfd::DfdArtifact;
use crate::pipeline::PipelineError;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Render the stored structured schema deterministically and persist the
/// resulting diagram artifact.
///
/// Cross-border flow labels are derived from the schema's flow flags; the
/// risk- and encryption-based flow lists only exist on the AI-assisted
/// path, since the schema does not carry those attributes per flow.
pub async fn render_stored_schema(
    pool: &SqlitePool,
    vertical_id: Uuid,
) -> Result<DfdArtifact, PipelineError> {
    let schema = db::matrix::load_schema_document(pool, vertical_id)
        .await?
        .ok_or_else(|| {
            PipelineError::Precondition(
                "No structured schema found. Generate the Data Matrix first.".to_string(),
            )
        })?;

    let mermaid_code = to_mermaid(&schema);

    let cross_border_flows: Vec<String> = schema
        .flows
        .iter()
        .filter(|f| f.cross_border == Some(true))
        .map(|f| f.label.clone())
        .collect();

    let artifact = DfdArtifact {
        vertical_id,
        source: "deterministic".to_string(),
        mermaid_code,
        summary: None,
        node_count: schema.nodes.len() as u32,
        edge_count: schema.flows.len() as u32,
        high_risk_flows: Vec::new(),
        cross_border_flows,
        unencrypted_flows: Vec::new(),
        generated_at: chrono::Utc::now().to_rfc3339(),
    };

    db::dfd::replace_dfd(pool, &artifact).await?;
    db::verticals::update_assessment_status(pool, vertical_id, "dfd_generated").await?;

    Ok(artifact)
}
