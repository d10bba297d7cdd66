//! Data matrix persistence
//!
//! Regeneration for a vertical is a replace, not a merge: the aggregate
//! upsert, the delete of prior rows, and the insert of the new set run in
//! one transaction, so repeated generation is idempotent and a concurrent
//! reader never observes the key empty mid-swap.

use crate::models::{
    ClassifiedDataElement, MatrixRow, RiskFactors, SchemaOne, ScoredElement,
};
use pdm_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Aggregate metadata recorded on each (re)generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerationMetadata {
    pub total_rows: usize,
    pub avg_confidence: f64,
    pub generated_at: String,
    pub sessions_used: Vec<String>,
}

fn to_json<T: Serialize>(value: &T, what: &'static str) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::serialize(what, e))
}

fn from_json<T: DeserializeOwned>(raw: &str, what: &'static str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| Error::corrupt(what, e))
}

/// Unit enum → stored token ("personal", "yes", ...); unit variants
/// serialize as a bare JSON string, so stripping the quotes yields the token
fn enum_to_str<T: Serialize>(value: &T, what: &'static str) -> Result<String> {
    let json = serde_json::to_string(value).map_err(|e| Error::serialize(what, e))?;
    Ok(json.trim_matches('"').to_string())
}

fn enum_from_str<T: DeserializeOwned>(raw: &str, what: &'static str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|e| Error::corrupt(what, e))
}

/// Replace all matrix rows for a vertical with a freshly generated set.
///
/// Runs as a single transaction: data_matrix aggregate upsert, delete of
/// existing rows, insert of the new rows.
pub async fn replace_matrix_rows(
    pool: &SqlitePool,
    vertical_id: Uuid,
    elements: &[ScoredElement],
    source_session_ids: &[String],
    metadata: &GenerationMetadata,
) -> Result<()> {
    let vertical_id_str = vertical_id.to_string();
    let metadata_json = to_json(metadata, "generation metadata")?;
    let session_ids_json = to_json(&source_session_ids, "source session ids")?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO data_matrix (vertical_id, status, generation_metadata)
        VALUES (?, 'draft', ?)
        ON CONFLICT(vertical_id) DO UPDATE SET
            status = 'draft',
            generation_metadata = excluded.generation_metadata
        "#,
    )
    .bind(&vertical_id_str)
    .bind(&metadata_json)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM data_matrix_rows WHERE vertical_id = ?")
        .bind(&vertical_id_str)
        .execute(&mut *tx)
        .await?;

    for scored in elements {
        let el = &scored.element;
        let consent = el
            .consent_mechanism
            .as_ref()
            .map(|c| to_json(c, "consent mechanism"))
            .transpose()?;
        let third_party = el
            .third_party_details
            .as_ref()
            .map(|t| to_json(t, "third party details"))
            .transpose()?;
        let cross_border = el
            .cross_border_details
            .as_ref()
            .map(|c| to_json(c, "cross border details"))
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO data_matrix_rows (
                row_id, vertical_id,
                data_element_name, data_category, data_sub_category, data_subjects,
                source_of_data, collection_method, purpose_of_processing, legal_basis,
                consent_mechanism, processing_types, systems_applications,
                storage_location, storage_format, encryption_at_rest, encryption_in_transit,
                retention_period, retention_compliant, deletion_method,
                access_roles, data_recipients_internal, data_recipients_external,
                third_party_details, cross_border_transfer, cross_border_details,
                data_owner, sensitivity_weight, processing_risk, volume_indicator,
                exposure_factor, risk_score, confidence_score, gaps_flagged,
                source_session_ids, status, generated_by
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'draft', 'ai')
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&vertical_id_str)
        .bind(&el.data_element_name)
        .bind(enum_to_str(&el.data_category, "data category")?)
        .bind(&el.data_sub_category)
        .bind(to_json(&el.data_subjects, "data subjects")?)
        .bind(&el.source_of_data)
        .bind(&el.collection_method)
        .bind(&el.purpose_of_processing)
        .bind(&el.legal_basis)
        .bind(consent)
        .bind(to_json(&el.processing_types, "processing types")?)
        .bind(to_json(&el.systems_applications, "systems applications")?)
        .bind(&el.storage_location)
        .bind(&el.storage_format)
        .bind(enum_to_str(&el.encryption_at_rest, "encryption at rest")?)
        .bind(enum_to_str(&el.encryption_in_transit, "encryption in transit")?)
        .bind(&el.retention_period)
        .bind(el.retention_compliant)
        .bind(&el.deletion_method)
        .bind(to_json(&el.access_roles, "access roles")?)
        .bind(to_json(&el.data_recipients_internal, "internal recipients")?)
        .bind(to_json(&el.data_recipients_external, "external recipients")?)
        .bind(third_party)
        .bind(el.cross_border_transfer)
        .bind(cross_border)
        .bind(&el.data_owner)
        .bind(scored.risk.sensitivity_weight as i64)
        .bind(scored.risk.processing_risk as i64)
        .bind(scored.risk.volume_indicator as i64)
        .bind(scored.risk.exposure_factor as i64)
        .bind(scored.risk.final_score as i64)
        .bind(el.confidence_score)
        .bind(to_json(&el.gaps_flagged, "flagged gaps")?)
        .bind(&session_ids_json)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        vertical_id = %vertical_id,
        rows = elements.len(),
        "Matrix rows replaced"
    );

    Ok(())
}

/// Load matrix rows for a vertical, highest risk first
pub async fn load_matrix_rows(pool: &SqlitePool, vertical_id: Uuid) -> Result<Vec<MatrixRow>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM data_matrix_rows
        WHERE vertical_id = ?
        ORDER BY risk_score DESC, data_element_name ASC
        "#,
    )
    .bind(vertical_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let row_id: String = row.get("row_id");
            let vertical_id: String = row.get("vertical_id");
            let data_category: String = row.get("data_category");
            let encryption_at_rest: String = row.get("encryption_at_rest");
            let encryption_in_transit: String = row.get("encryption_in_transit");
            let data_subjects: String = row.get("data_subjects");
            let processing_types: String = row.get("processing_types");
            let systems_applications: String = row.get("systems_applications");
            let access_roles: String = row.get("access_roles");
            let recipients_internal: String = row.get("data_recipients_internal");
            let recipients_external: String = row.get("data_recipients_external");
            let gaps_flagged: String = row.get("gaps_flagged");
            let source_session_ids: String = row.get("source_session_ids");
            let consent: Option<String> = row.get("consent_mechanism");
            let third_party: Option<String> = row.get("third_party_details");
            let cross_border: Option<String> = row.get("cross_border_details");

            let element = ClassifiedDataElement {
                data_element_name: row.get("data_element_name"),
                data_category: enum_from_str(&data_category, "data category")?,
                data_sub_category: row.get("data_sub_category"),
                data_subjects: from_json(&data_subjects, "data subjects")?,
                source_of_data: row.get("source_of_data"),
                collection_method: row.get("collection_method"),
                purpose_of_processing: row.get("purpose_of_processing"),
                legal_basis: row.get("legal_basis"),
                consent_mechanism: consent
                    .map(|c| from_json(&c, "consent mechanism"))
                    .transpose()?,
                processing_types: from_json(&processing_types, "processing types")?,
                systems_applications: from_json(&systems_applications, "systems applications")?,
                storage_location: row.get("storage_location"),
                storage_format: row.get("storage_format"),
                encryption_at_rest: enum_from_str(&encryption_at_rest, "encryption at rest")?,
                encryption_in_transit: enum_from_str(
                    &encryption_in_transit,
                    "encryption in transit",
                )?,
                retention_period: row.get("retention_period"),
                retention_compliant: row.get("retention_compliant"),
                deletion_method: row.get("deletion_method"),
                access_roles: from_json(&access_roles, "access roles")?,
                data_recipients_internal: from_json(&recipients_internal, "internal recipients")?,
                data_recipients_external: from_json(&recipients_external, "external recipients")?,
                third_party_details: third_party
                    .map(|t| from_json(&t, "third party details"))
                    .transpose()?,
                cross_border_transfer: row.get("cross_border_transfer"),
                cross_border_details: cross_border
                    .map(|c| from_json(&c, "cross border details"))
                    .transpose()?,
                data_owner: row.get("data_owner"),
                confidence_score: row.get("confidence_score"),
                gaps_flagged: from_json(&gaps_flagged, "flagged gaps")?,
            };

            let risk = RiskFactors {
                sensitivity_weight: row.get::<i64, _>("sensitivity_weight") as u8,
                processing_risk: row.get::<i64, _>("processing_risk") as u8,
                volume_indicator: row.get::<i64, _>("volume_indicator") as u8,
                exposure_factor: row.get::<i64, _>("exposure_factor") as u8,
                final_score: row.get::<i64, _>("risk_score") as u8,
            };

            Ok(MatrixRow {
                id: Uuid::parse_str(&row_id).map_err(|e| Error::corrupt("row id", e))?,
                vertical_id: Uuid::parse_str(&vertical_id)
                    .map_err(|e| Error::corrupt("vertical id", e))?,
                element,
                risk,
                source_session_ids: from_json(&source_session_ids, "source session ids")?,
                status: row.get("status"),
                generated_by: row.get("generated_by"),
            })
        })
        .collect()
}

/// Upsert the structured schema document for a vertical
pub async fn save_schema_document(
    pool: &SqlitePool,
    vertical_id: Uuid,
    schema: &SchemaOne,
) -> Result<()> {
    let schema_json = to_json(schema, "structured schema")?;

    sqlx::query(
        r#"
        INSERT INTO data_matrix (vertical_id, schema_one)
        VALUES (?, ?)
        ON CONFLICT(vertical_id) DO UPDATE SET schema_one = excluded.schema_one
        "#,
    )
    .bind(vertical_id.to_string())
    .bind(&schema_json)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_schema_document(
    pool: &SqlitePool,
    vertical_id: Uuid,
) -> Result<Option<SchemaOne>> {
    let raw: Option<Option<String>> =
        sqlx::query_scalar("SELECT schema_one FROM data_matrix WHERE vertical_id = ?")
            .bind(vertical_id.to_string())
            .fetch_optional(pool)
            .await?;

    match raw.flatten() {
        Some(json) => Ok(Some(from_json(&json, "structured schema")?)),
        None => Ok(None),
    }
}
