//! Stage 1: per-session entity extraction with bounded fan-out

use super::prompts::entity_extraction_prompt;
use crate::db::sessions::InterviewSession;
use crate::genai::{GenerationClient, GenerationError, DEFAULT_MAX_RETRIES};
use crate::models::EntityExtractionResult;
use futures::future::join_all;

/// Sessions processed in parallel per batch
const EXTRACTION_BATCH_SIZE: usize = 3;

const EXTRACTION_TEMPERATURE: f32 = 0.1;

/// Extract privacy entities from a single session.
///
/// Sessions with no textual content short-circuit to an empty result
/// without a generation call.
pub async fn extract_entities(
    client: &GenerationClient,
    session: &InterviewSession,
    vertical_name: &str,
) -> Result<EntityExtractionResult, GenerationError> {
    let content = session.combined_text();
    if content.trim().is_empty() {
        return Ok(EntityExtractionResult {
            session_id: session.session_id.to_string(),
            entities: Vec::new(),
        });
    }

    let prompt = entity_extraction_prompt(&content, vertical_name);
    let mut result: EntityExtractionResult = client
        .call(&prompt, EXTRACTION_TEMPERATURE, DEFAULT_MAX_RETRIES)
        .await?;

    // Override session_id to ensure correctness regardless of model output
    result.session_id = session.session_id.to_string();
    Ok(result)
}

/// Extract entities from all sessions with bounded parallelism.
///
/// Sessions are partitioned into fixed-size batches; each batch runs with
/// full internal parallelism and the whole batch completes before the
/// next starts, so results stay in session order across batches and
/// `on_progress(completed, total)` fires once per finished batch.
pub async fn extract_entities_batch(
    client: &GenerationClient,
    sessions: &[InterviewSession],
    vertical_name: &str,
    mut on_progress: impl FnMut(usize, usize),
) -> Result<Vec<EntityExtractionResult>, GenerationError> {
    let total = sessions.len();
    let mut results = Vec::with_capacity(total);
    let mut completed = 0;

    for batch in sessions.chunks(EXTRACTION_BATCH_SIZE) {
        let batch_results = join_all(
            batch
                .iter()
                .map(|session| extract_entities(client, session, vertical_name)),
        )
        .await;

        for result in batch_results {
            results.push(result?);
        }

        completed += batch.len();
        on_progress(completed, total);
    }

    Ok(results)
}
