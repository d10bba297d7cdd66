//! Stage 1 output: privacy entities extracted from a single session

use serde::{Deserialize, Serialize};

/// Category of an extracted privacy entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    DataElement,
    System,
    Actor,
    ProcessingActivity,
    ThirdParty,
}

/// One privacy-relevant entity found in session text, with the quote that
/// supports it. Transient: discarded once the relationship graph is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub entity_type: EntityType,
    /// Normalized entity name
    pub name: String,
    /// Exact or near-exact quote from the source text
    pub context_quote: String,
    /// Extraction confidence 0-1
    pub confidence: f64,
}

/// All entities extracted from one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityExtractionResult {
    pub session_id: String,
    pub entities: Vec<ExtractedEntity>,
}
