//! Structured schema API handlers
//!
//! The structured schema can be stored directly (externally produced) or
//! synthesized from the finalized session texts; the deterministic render
//! endpoint converts whichever schema is stored into a Mermaid diagram.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db;
use crate::db::dfd::DfdArtifact;
use crate::diagram;
use crate::error::{ApiError, ApiResult};
use crate::models::SchemaOne;
use crate::pipeline::schema_synthesis;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SchemaSummaryResponse {
    pub node_count: usize,
    pub flow_count: usize,
}

/// PUT /verticals/{id}/schema - store an externally produced schema
///
/// The document is reference-validated before it is stored: every flow
/// endpoint must name a node.
pub async fn put_schema(
    State(state): State<AppState>,
    Path(vertical_id): Path<Uuid>,
    Json(schema): Json<SchemaOne>,
) -> ApiResult<Json<SchemaSummaryResponse>> {
    if db::verticals::load_vertical(&state.db, vertical_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!(
            "Vertical not found: {}",
            vertical_id
        )));
    }

    schema.validate()?;
    db::matrix::save_schema_document(&state.db, vertical_id, &schema).await?;

    Ok(Json(SchemaSummaryResponse {
        node_count: schema.nodes.len(),
        flow_count: schema.flows.len(),
    }))
}

/// GET /verticals/{id}/schema - stored schema document
pub async fn get_schema(
    State(state): State<AppState>,
    Path(vertical_id): Path<Uuid>,
) -> ApiResult<Json<SchemaOne>> {
    db::matrix::load_schema_document(&state.db, vertical_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!("No schema found for vertical {}", vertical_id))
        })
}

/// POST /verticals/{id}/schema/generate - synthesize the schema from the
/// finalized session texts (synchronous)
pub async fn generate_schema(
    State(state): State<AppState>,
    Path(vertical_id): Path<Uuid>,
) -> ApiResult<Json<SchemaSummaryResponse>> {
    let client = state.generation_client()?;
    let schema = schema_synthesis::synthesize_schema(&state.db, &client, vertical_id).await?;

    Ok(Json(SchemaSummaryResponse {
        node_count: schema.nodes.len(),
        flow_count: schema.flows.len(),
    }))
}

/// POST /verticals/{id}/dfd/render - deterministic Mermaid render of the
/// stored schema (synchronous)
pub async fn render_dfd(
    State(state): State<AppState>,
    Path(vertical_id): Path<Uuid>,
) -> ApiResult<Json<DfdArtifact>> {
    let artifact = diagram::render_stored_schema(&state.db, vertical_id).await?;
    Ok(Json(artifact))
}
