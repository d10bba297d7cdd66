//! Vertical record access (pipeline boundary)
//!
//! Verticals are owned by an external collaborator; the engine needs just
//! enough access to read assessment context and advance the assessment
//! status as generations complete.

use pdm_common::{Error, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Assessment context for one vertical
#[derive(Debug, Clone, Serialize)]
pub struct Vertical {
    pub vertical_id: Uuid,
    pub name: String,
    pub industry: String,
    pub regulatory_scope: Vec<String>,
    pub assessment_status: String,
}

pub async fn save_vertical(pool: &SqlitePool, vertical: &Vertical) -> Result<()> {
    let regulatory_scope = serde_json::to_string(&vertical.regulatory_scope)
        .map_err(|e| Error::serialize("regulatory scope", e))?;

    sqlx::query(
        r#"
        INSERT INTO verticals (vertical_id, name, industry, regulatory_scope, assessment_status)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(vertical_id) DO UPDATE SET
            name = excluded.name,
            industry = excluded.industry,
            regulatory_scope = excluded.regulatory_scope
        "#,
    )
    .bind(vertical.vertical_id.to_string())
    .bind(&vertical.name)
    .bind(&vertical.industry)
    .bind(&regulatory_scope)
    .bind(&vertical.assessment_status)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_vertical(pool: &SqlitePool, vertical_id: Uuid) -> Result<Option<Vertical>> {
    let row = sqlx::query(
        r#"
        SELECT vertical_id, name, industry, regulatory_scope, assessment_status
        FROM verticals WHERE vertical_id = ?
        "#,
    )
    .bind(vertical_id.to_string())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let id_str: String = row.get("vertical_id");
    let regulatory_scope: String = row.get("regulatory_scope");

    Ok(Some(Vertical {
        vertical_id: Uuid::parse_str(&id_str).map_err(|e| Error::corrupt("vertical id", e))?,
        name: row.get("name"),
        industry: row.get("industry"),
        regulatory_scope: serde_json::from_str(&regulatory_scope)
            .map_err(|e| Error::corrupt("regulatory scope", e))?,
        assessment_status: row.get("assessment_status"),
    }))
}

/// Advance the assessment status ("matrix_generated", "dfd_generated", ...)
pub async fn update_assessment_status(
    pool: &SqlitePool,
    vertical_id: Uuid,
    status: &str,
) -> Result<()> {
    sqlx::query("UPDATE verticals SET assessment_status = ? WHERE vertical_id = ?")
        .bind(status)
        .bind(vertical_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
