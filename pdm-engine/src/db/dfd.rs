//! DFD artifact persistence
//!
//! One diagram per vertical; regeneration replaces the stored artifact.

use pdm_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Persisted diagram artifact.
///
/// `source` records which compiler produced it: "deterministic" (Schema-1
/// converter) or "ai" (matrix-row synthesizer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DfdArtifact {
    pub vertical_id: Uuid,
    pub source: String,
    pub mermaid_code: String,
    pub summary: Option<String>,
    pub node_count: u32,
    pub edge_count: u32,
    pub high_risk_flows: Vec<String>,
    pub cross_border_flows: Vec<String>,
    pub unencrypted_flows: Vec<String>,
    pub generated_at: String,
}

/// Replace the stored diagram artifact for a vertical
pub async fn replace_dfd(pool: &SqlitePool, artifact: &DfdArtifact) -> Result<()> {
    let high_risk = serde_json::to_string(&artifact.high_risk_flows)
        .map_err(|e| Error::serialize("high risk flows", e))?;
    let cross_border = serde_json::to_string(&artifact.cross_border_flows)
        .map_err(|e| Error::serialize("cross border flows", e))?;
    let unencrypted = serde_json::to_string(&artifact.unencrypted_flows)
        .map_err(|e| Error::serialize("unencrypted flows", e))?;

    sqlx::query(
        r#"
        INSERT INTO dfd_graphs (
            vertical_id, source, mermaid_code, summary, node_count, edge_count,
            high_risk_flows, cross_border_flows, unencrypted_flows, generated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(vertical_id) DO UPDATE SET
            source = excluded.source,
            mermaid_code = excluded.mermaid_code,
            summary = excluded.summary,
            node_count = excluded.node_count,
            edge_count = excluded.edge_count,
            high_risk_flows = excluded.high_risk_flows,
            cross_border_flows = excluded.cross_border_flows,
            unencrypted_flows = excluded.unencrypted_flows,
            generated_at = excluded.generated_at
        "#,
    )
    .bind(artifact.vertical_id.to_string())
    .bind(&artifact.source)
    .bind(&artifact.mermaid_code)
    .bind(&artifact.summary)
    .bind(artifact.node_count as i64)
    .bind(artifact.edge_count as i64)
    .bind(&high_risk)
    .bind(&cross_border)
    .bind(&unencrypted)
    .bind(&artifact.generated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_dfd(pool: &SqlitePool, vertical_id: Uuid) -> Result<Option<DfdArtifact>> {
    let row = sqlx::query(
        r#"
        SELECT vertical_id, source, mermaid_code, summary, node_count, edge_count,
               high_risk_flows, cross_border_flows, unencrypted_flows, generated_at
        FROM dfd_graphs WHERE vertical_id = ?
        "#,
    )
    .bind(vertical_id.to_string())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let vertical_id_str: String = row.get("vertical_id");
    let high_risk: String = row.get("high_risk_flows");
    let cross_border: String = row.get("cross_border_flows");
    let unencrypted: String = row.get("unencrypted_flows");

    Ok(Some(DfdArtifact {
        vertical_id: Uuid::parse_str(&vertical_id_str)
            .map_err(|e| Error::corrupt("vertical id", e))?,
        source: row.get("source"),
        mermaid_code: row.get("mermaid_code"),
        summary: row.get("summary"),
        node_count: row.get::<i64, _>("node_count") as u32,
        edge_count: row.get::<i64, _>("edge_count") as u32,
        high_risk_flows: serde_json::from_str(&high_risk)
            .map_err(|e| Error::corrupt("high risk flows", e))?,
        cross_border_flows: serde_json::from_str(&cross_border)
            .map_err(|e| Error::corrupt("cross border flows", e))?,
        unencrypted_flows: serde_json::from_str(&unencrypted)
            .map_err(|e| Error::corrupt("unencrypted flows", e))?,
        generated_at: row.get("generated_at"),
    }))
}
