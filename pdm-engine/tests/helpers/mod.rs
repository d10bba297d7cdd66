//! Shared test helpers: scripted generation provider and database seeding
#![allow(dead_code)]

use async_trait::async_trait;
use pdm_engine::db;
use pdm_engine::db::sessions::InterviewSession;
use pdm_engine::db::verticals::Vertical;
use pdm_engine::genai::{GenerationProvider, ProviderError};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

/// Scripted provider: dispatches canned responses on prompt markers and
/// records every prompt for assertions.
#[derive(Default)]
pub struct MockProvider {
    /// (session marker substring, extraction response JSON)
    pub extraction_responses: Vec<(String, String)>,
    pub graph_response: Option<String>,
    pub classification_response: Option<String>,
    pub dfd_response: Option<String>,
    pub schema_response: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if prompt.contains("Extract all privacy-relevant entities") {
            for (marker, response) in &self.extraction_responses {
                if prompt.contains(marker.as_str()) {
                    return Ok(response.clone());
                }
            }
            return Err(ProviderError::Api(
                500,
                "no scripted extraction response matches prompt".to_string(),
            ));
        }
        if prompt.contains("construct a relationship graph") {
            if let Some(response) = &self.graph_response {
                return Ok(response.clone());
            }
        }
        if prompt.contains("privacy compliance expert") {
            if let Some(response) = &self.classification_response {
                return Ok(response.clone());
            }
        }
        if prompt.contains("Generate a Mermaid data flow diagram") {
            if let Some(response) = &self.dfd_response {
                return Ok(response.clone());
            }
        }
        if prompt.contains("Privacy Impact Assessment") {
            if let Some(response) = &self.schema_response {
                return Ok(response.clone());
            }
        }

        Err(ProviderError::Api(
            500,
            "no scripted response for prompt".to_string(),
        ))
    }
}

/// Fresh SQLite database in a temp dir; returns the pool and the guard
/// keeping the directory alive
pub async fn test_db() -> (SqlitePool, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let db_path: PathBuf = dir.path().join("pdm-test.db");
    let pool = db::init_database_pool(&db_path)
        .await
        .expect("init test database");
    (pool, dir)
}

pub async fn seed_vertical(pool: &SqlitePool, name: &str) -> Uuid {
    let vertical = Vertical {
        vertical_id: Uuid::new_v4(),
        name: name.to_string(),
        industry: "Financial Services".to_string(),
        regulatory_scope: vec!["DPDPA".to_string(), "GDPR".to_string()],
        assessment_status: "pending".to_string(),
    };
    db::verticals::save_vertical(pool, &vertical)
        .await
        .expect("seed vertical");
    vertical.vertical_id
}

/// Fully populated scored element for persistence-layer tests
pub fn scored_element(name: &str, confidence: f64) -> pdm_engine::models::ScoredElement {
    use pdm_engine::models::{
        ClassifiedDataElement, DataCategory, EncryptionStatus, RiskFactors, ScoredElement,
    };

    ScoredElement {
        element: ClassifiedDataElement {
            data_element_name: name.to_string(),
            data_category: DataCategory::Personal,
            data_sub_category: None,
            data_subjects: vec!["employees".to_string()],
            source_of_data: "HR onboarding".to_string(),
            collection_method: "Onboarding form".to_string(),
            purpose_of_processing: "Payroll and communication".to_string(),
            legal_basis: "Contract".to_string(),
            consent_mechanism: None,
            processing_types: vec!["storage".to_string(), "sharing".to_string()],
            systems_applications: vec!["HRMS".to_string(), "Oracle DB".to_string()],
            storage_location: "HRMS; Oracle DB".to_string(),
            storage_format: "Database".to_string(),
            encryption_at_rest: EncryptionStatus::Unknown,
            encryption_in_transit: EncryptionStatus::Yes,
            retention_period: None,
            retention_compliant: None,
            deletion_method: None,
            access_roles: vec![],
            data_recipients_internal: vec!["Finance".to_string()],
            data_recipients_external: vec!["ADP".to_string()],
            third_party_details: None,
            cross_border_transfer: true,
            cross_border_details: None,
            data_owner: "HR Department".to_string(),
            confidence_score: confidence,
            gaps_flagged: vec!["Retention period not discussed".to_string()],
        },
        risk: RiskFactors {
            sensitivity_weight: 3,
            processing_risk: 4,
            volume_indicator: 3,
            exposure_factor: 5,
            final_score: 8,
        },
    }
}

pub async fn seed_session(
    pool: &SqlitePool,
    vertical_id: Uuid,
    session_number: i64,
    status: &str,
    notes: Option<&str>,
) -> Uuid {
    let session = InterviewSession {
        session_id: Uuid::new_v4(),
        vertical_id,
        session_number,
        status: status.to_string(),
        raw_text_notes: notes.map(|n| n.to_string()),
        transcribed_text: None,
        interviewee_names: vec!["A. Interviewee".to_string()],
        interviewee_roles: vec!["Manager".to_string()],
    };
    db::sessions::save_session(pool, &session)
        .await
        .expect("seed session");
    session.session_id
}
