//! Stage 3 output: fully attributed, regulation-aware data element records
//! plus the deterministic risk factors computed from them

use super::graph::DataCategory;
use serde::{Deserialize, Serialize};

/// Encryption posture for data at rest or in transit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionStatus {
    Yes,
    No,
    Partial,
    Unknown,
}

/// How consent is obtained and withdrawn, where applicable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentMechanism {
    #[serde(rename = "type")]
    pub consent_type: String,
    pub collection_point: String,
    pub withdrawal_method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRole {
    pub role: String,
    pub access_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThirdPartyDetail {
    pub party_name: String,
    pub purpose: String,
    pub agreement_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossBorderDetail {
    pub destination_country: String,
    pub transfer_mechanism: String,
}

/// Fully attributed data element record.
///
/// Every attribute is populated by Stage 3; where source evidence is
/// insufficient the confidence score drops below 0.5 and a human-readable
/// gap description lands in `gaps_flagged` (enforced by the classification
/// prompt and downstream review, not mechanically).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedDataElement {
    pub data_element_name: String,
    pub data_category: DataCategory,
    pub data_sub_category: Option<String>,
    pub data_subjects: Vec<String>,
    pub source_of_data: String,
    pub collection_method: String,
    pub purpose_of_processing: String,
    pub legal_basis: String,
    pub consent_mechanism: Option<ConsentMechanism>,
    pub processing_types: Vec<String>,
    pub systems_applications: Vec<String>,
    pub storage_location: String,
    pub storage_format: String,
    pub encryption_at_rest: EncryptionStatus,
    pub encryption_in_transit: EncryptionStatus,
    pub retention_period: Option<String>,
    pub retention_compliant: Option<bool>,
    pub deletion_method: Option<String>,
    pub access_roles: Vec<AccessRole>,
    pub data_recipients_internal: Vec<String>,
    pub data_recipients_external: Vec<String>,
    pub third_party_details: Option<Vec<ThirdPartyDetail>>,
    pub cross_border_transfer: bool,
    pub cross_border_details: Option<CrossBorderDetail>,
    pub data_owner: String,
    pub confidence_score: f64,
    pub gaps_flagged: Vec<String>,
}

/// Stage 3 result, one-to-one with the canonical element input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub elements: Vec<ClassifiedDataElement>,
}

/// Deterministic risk factors for one data element.
///
/// Each factor is in `[1, 5]`; `final_score` is in `[1, 25]` and is a pure
/// function of the classified element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub sensitivity_weight: u8,
    pub processing_risk: u8,
    pub volume_indicator: u8,
    pub exposure_factor: u8,
    pub final_score: u8,
}

/// A classified element together with its computed risk factors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredElement {
    #[serde(flatten)]
    pub element: ClassifiedDataElement,
    pub risk: RiskFactors,
}
