//! Structured schema (Schema-1) synthesis
//!
//! One generation call over the combined session texts produces the graph
//! document that the deterministic diagram converter consumes. The result
//! is reference-validated (flow endpoints must name real nodes) before it
//! is stored on the data_matrix aggregate.

use super::prompts::schema_one_prompt;
use super::PipelineError;
use crate::db;
use crate::genai::{GenerationClient, GenerationError, DEFAULT_MAX_RETRIES};
use crate::models::SchemaOne;
use sqlx::SqlitePool;
use uuid::Uuid;

const SCHEMA_TEMPERATURE: f32 = 0.1;

/// Synthesize and store the structured schema for a vertical
pub async fn synthesize_schema(
    pool: &SqlitePool,
    client: &GenerationClient,
    vertical_id: Uuid,
) -> Result<SchemaOne, PipelineError> {
    let vertical = db::verticals::load_vertical(pool, vertical_id)
        .await?
        .ok_or_else(|| PipelineError::Precondition("Vertical not found".to_string()))?;

    let sessions = db::sessions::load_finalized_sessions(pool, vertical_id).await?;
    if sessions.is_empty() {
        return Err(PipelineError::Precondition(
            "No finalized sessions found. Please finalize at least one session.".to_string(),
        ));
    }

    let mut combined = String::new();
    for session in &sessions {
        if let Some(notes) = &session.raw_text_notes {
            if !notes.trim().is_empty() {
                combined.push_str(&format!(
                    "\n--- Session {} Notes ---\n{}\n",
                    session.session_number, notes
                ));
            }
        }
        if let Some(transcript) = &session.transcribed_text {
            if !transcript.trim().is_empty() {
                combined.push_str(&format!(
                    "\n--- Session {} Documents ---\n{}\n",
                    session.session_number, transcript
                ));
            }
        }
    }

    if combined.trim().is_empty() {
        return Err(PipelineError::Precondition(
            "No transcript text found in finalized sessions.".to_string(),
        ));
    }

    tracing::info!(
        vertical_id = %vertical_id,
        vertical = %vertical.name,
        sessions = sessions.len(),
        "Synthesizing structured schema"
    );

    let prompt = schema_one_prompt(&combined);
    let schema: SchemaOne = client
        .call(&prompt, SCHEMA_TEMPERATURE, DEFAULT_MAX_RETRIES)
        .await?;

    schema
        .validate()
        .map_err(|e| GenerationError::Validation(e.to_string()))?;

    db::matrix::save_schema_document(pool, vertical_id, &schema).await?;

    tracing::info!(
        vertical_id = %vertical_id,
        nodes = schema.nodes.len(),
        flows = schema.flows.len(),
        "Structured schema stored"
    );

    Ok(schema)
}
