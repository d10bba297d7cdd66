//! Stage 2 output: canonical data elements with relationship attributes

use serde::{Deserialize, Serialize};

/// Privacy classification of a data element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    Personal,
    SensitivePersonal,
    NonPersonal,
    Anonymized,
    Pseudonymized,
}

/// One canonical (merged, de-duplicated-by-name) data element and its
/// relationships across every contributing session.
///
/// The union rule applies: an element stored in location A per one session
/// and location B per another carries both locations here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataElementRelationship {
    pub data_element: String,
    pub category: DataCategory,
    pub data_subjects: Vec<String>,
    /// Actors/roles that collect this data
    pub collected_by: Vec<String>,
    pub collection_methods: Vec<String>,
    /// Systems/apps that process this data
    pub systems: Vec<String>,
    pub storage_locations: Vec<String>,
    pub processing_activities: Vec<String>,
    pub access_roles: Vec<String>,
    pub shared_with_internal: Vec<String>,
    pub shared_with_external: Vec<String>,
    pub cross_border: bool,
    pub cross_border_details: Option<String>,
    pub retention_info: Option<String>,
    pub consent_info: Option<String>,
    pub source_session_ids: Vec<String>,
    /// How much of the attribution was explicit versus inferred (0-1)
    pub confidence: f64,
}

/// Stage 2 result for one vertical
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipGraphResult {
    pub vertical_name: String,
    pub data_elements: Vec<DataElementRelationship>,
}
