//! Stage 2: relationship graph construction
//!
//! Single generation call that merges per-session entities into canonical
//! data elements. The prompt enforces union semantics: attribution from
//! every contributing session is retained, not overwritten.

use super::prompts::relationship_graph_prompt;
use crate::genai::{GenerationClient, GenerationError, DEFAULT_MAX_RETRIES};
use crate::models::{EntityExtractionResult, RelationshipGraphResult};
use serde::Serialize;

const GRAPH_TEMPERATURE: f32 = 0.1;

#[derive(Serialize)]
struct EntityWithSession<'a> {
    entity_type: &'a crate::models::EntityType,
    name: &'a str,
    context_quote: &'a str,
    confidence: f64,
    session_id: &'a str,
}

/// Build the canonical element graph from all extracted entities.
///
/// Zero input entities short-circuit to an empty graph without a
/// generation call.
pub async fn build_relationship_graph(
    client: &GenerationClient,
    extraction_results: &[EntityExtractionResult],
    vertical_name: &str,
) -> Result<RelationshipGraphResult, GenerationError> {
    let all_entities: Vec<EntityWithSession> = extraction_results
        .iter()
        .flat_map(|result| {
            result.entities.iter().map(|e| EntityWithSession {
                entity_type: &e.entity_type,
                name: &e.name,
                context_quote: &e.context_quote,
                confidence: e.confidence,
                session_id: &result.session_id,
            })
        })
        .collect();

    if all_entities.is_empty() {
        return Ok(RelationshipGraphResult {
            vertical_name: vertical_name.to_string(),
            data_elements: Vec::new(),
        });
    }

    let entities_json = serde_json::to_string_pretty(&all_entities)
        .map_err(|e| GenerationError::Validation(format!("Failed to serialize entities: {}", e)))?;
    let prompt = relationship_graph_prompt(&entities_json, vertical_name);

    client.call(&prompt, GRAPH_TEMPERATURE, DEFAULT_MAX_RETRIES).await
}
