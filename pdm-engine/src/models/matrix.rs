//! Persisted data matrix row

use super::classified::{ClassifiedDataElement, RiskFactors};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One persisted, risk-scored data element for a vertical.
///
/// Invariant: one row per normalized element name per generation;
/// regeneration replaces all rows for the vertical, it never merges
/// across generations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixRow {
    pub id: Uuid,
    pub vertical_id: Uuid,
    #[serde(flatten)]
    pub element: ClassifiedDataElement,
    pub risk: RiskFactors,
    pub source_session_ids: Vec<String>,
    /// Downstream review workflow state ("draft" on generation)
    pub status: String,
    pub generated_by: String,
}
