//! Boundary record accessors
//!
//! Minimal vertical/session write access so the engine is exercisable end
//! to end, plus read access to the persisted generation artifacts. Full
//! record CRUD lives in an external collaborator.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db;
use crate::db::dfd::DfdArtifact;
use crate::db::sessions::InterviewSession;
use crate::db::verticals::Vertical;
use crate::error::{ApiError, ApiResult};
use crate::models::MatrixRow;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateVerticalRequest {
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub regulatory_scope: Vec<String>,
}

/// POST /verticals
pub async fn create_vertical(
    State(state): State<AppState>,
    Json(request): Json<CreateVerticalRequest>,
) -> ApiResult<(StatusCode, Json<Vertical>)> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }

    let vertical = Vertical {
        vertical_id: Uuid::new_v4(),
        name: request.name,
        industry: request.industry.unwrap_or_else(|| "General".to_string()),
        regulatory_scope: request.regulatory_scope,
        assessment_status: "pending".to_string(),
    };
    db::verticals::save_vertical(&state.db, &vertical).await?;

    tracing::info!(vertical_id = %vertical.vertical_id, name = %vertical.name, "Vertical created");
    Ok((StatusCode::CREATED, Json(vertical)))
}

/// GET /verticals/{id}
pub async fn get_vertical(
    State(state): State<AppState>,
    Path(vertical_id): Path<Uuid>,
) -> ApiResult<Json<Vertical>> {
    db::verticals::load_vertical(&state.db, vertical_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Vertical not found: {}", vertical_id)))
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub session_number: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub raw_text_notes: Option<String>,
    #[serde(default)]
    pub transcribed_text: Option<String>,
    #[serde(default)]
    pub interviewee_names: Vec<String>,
    #[serde(default)]
    pub interviewee_roles: Vec<String>,
}

/// POST /verticals/{id}/sessions
pub async fn create_session(
    State(state): State<AppState>,
    Path(vertical_id): Path<Uuid>,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<InterviewSession>)> {
    if db::verticals::load_vertical(&state.db, vertical_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!(
            "Vertical not found: {}",
            vertical_id
        )));
    }

    let session = InterviewSession {
        session_id: Uuid::new_v4(),
        vertical_id,
        session_number: request.session_number.unwrap_or(1),
        status: request.status.unwrap_or_else(|| "draft".to_string()),
        raw_text_notes: request.raw_text_notes,
        transcribed_text: request.transcribed_text,
        interviewee_names: request.interviewee_names,
        interviewee_roles: request.interviewee_roles,
    };
    db::sessions::save_session(&state.db, &session).await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /verticals/{id}/matrix - persisted matrix rows, highest risk first
pub async fn get_matrix(
    State(state): State<AppState>,
    Path(vertical_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MatrixRow>>> {
    let rows = db::matrix::load_matrix_rows(&state.db, vertical_id).await?;
    Ok(Json(rows))
}

/// GET /verticals/{id}/dfd - persisted diagram artifact
pub async fn get_dfd(
    State(state): State<AppState>,
    Path(vertical_id): Path<Uuid>,
) -> ApiResult<Json<DfdArtifact>> {
    db::dfd::load_dfd(&state.db, vertical_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No DFD found for vertical {}", vertical_id)))
}
