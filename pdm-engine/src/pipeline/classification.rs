//! Stage 3: classification and enrichment
//!
//! Expands each canonical element into a fully attributed, regulation-aware
//! record, one-to-one with the input. Fabrication is prohibited by the
//! prompt contract: insufficient evidence must surface as sub-0.5
//! confidence plus a flagged gap instead of an invented value.

use super::prompts::classification_prompt;
use crate::genai::{GenerationClient, GenerationError, DEFAULT_MAX_RETRIES};
use crate::models::{ClassificationResult, RelationshipGraphResult};

const CLASSIFICATION_TEMPERATURE: f32 = 0.1;

/// Classify and enrich the canonical data elements.
///
/// An empty graph short-circuits to an empty result without a generation
/// call.
pub async fn classify_elements(
    client: &GenerationClient,
    graph: &RelationshipGraphResult,
    industry: &str,
    regulatory_scope: &[String],
) -> Result<ClassificationResult, GenerationError> {
    if graph.data_elements.is_empty() {
        return Ok(ClassificationResult {
            elements: Vec::new(),
        });
    }

    let elements_json = serde_json::to_string_pretty(&graph.data_elements).map_err(|e| {
        GenerationError::Validation(format!("Failed to serialize data elements: {}", e))
    })?;
    let prompt = classification_prompt(
        &elements_json,
        &graph.vertical_name,
        industry,
        regulatory_scope,
    );

    client
        .call(&prompt, CLASSIFICATION_TEMPERATURE, DEFAULT_MAX_RETRIES)
        .await
}
