//! Generation trigger API handlers
//!
//! POST /verticals/{id}/matrix/generate, POST /verticals/{id}/dfd/generate
//!
//! Both triggers start a named job (`matrix-<id>` / `dfd-<id>`) and return
//! immediately; progress streams over the job events endpoint. A second
//! trigger while the job is running gets 409 Conflict instead of a
//! duplicate run.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::diagram::DfdGenerator;
use crate::error::{ApiError, ApiResult};
use crate::pipeline::MatrixGenerator;
use crate::AppState;

/// Generation trigger response
#[derive(Debug, Serialize)]
pub struct StartGenerationResponse {
    pub job_id: String,
    pub status: &'static str,
}

/// POST /verticals/{id}/matrix/generate
///
/// Returns 202 Accepted with the job id, or 409 Conflict while a matrix
/// job for this vertical is still running; preconditions (missing
/// vertical, no finalized sessions) surface through the job's progress
/// stream.
pub async fn generate_matrix(
    State(state): State<AppState>,
    Path(vertical_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<StartGenerationResponse>)> {
    let client = state.generation_client()?;
    let job_id = format!("matrix-{}", vertical_id);
    let db = state.db.clone();

    let outcome = state.jobs.start(&job_id, move |emitter| async move {
        let generator = MatrixGenerator::new(db, client);
        let emit = move |event| emitter.emit(event);
        let summary = generator.generate(vertical_id, &emit).await?;
        Ok(serde_json::to_value(summary)?)
    });

    if outcome.already_running() {
        tracing::info!(job_id = %job_id, "Matrix generation already running");
        return Err(ApiError::Conflict(format!(
            "Matrix generation already running (job {})",
            job_id
        )));
    }

    tracing::info!(job_id = %job_id, vertical_id = %vertical_id, "Matrix generation started");
    Ok((
        StatusCode::ACCEPTED,
        Json(StartGenerationResponse {
            job_id,
            status: "started",
        }),
    ))
}

/// POST /verticals/{id}/dfd/generate
///
/// AI-assisted diagram synthesis from the persisted matrix rows. Returns
/// 202 Accepted, or 409 Conflict while a DFD job for this vertical is
/// still running.
pub async fn generate_dfd(
    State(state): State<AppState>,
    Path(vertical_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<StartGenerationResponse>)> {
    let client = state.generation_client()?;
    let job_id = format!("dfd-{}", vertical_id);
    let db = state.db.clone();

    let outcome = state.jobs.start(&job_id, move |emitter| async move {
        let generator = DfdGenerator::new(db, client);
        let emit = move |event| emitter.emit(event);
        let summary = generator.generate(vertical_id, &emit).await?;
        Ok(serde_json::to_value(summary)?)
    });

    if outcome.already_running() {
        tracing::info!(job_id = %job_id, "DFD generation already running");
        return Err(ApiError::Conflict(format!(
            "DFD generation already running (job {})",
            job_id
        )));
    }

    tracing::info!(job_id = %job_id, vertical_id = %vertical_id, "DFD generation started");
    Ok((
        StatusCode::ACCEPTED,
        Json(StartGenerationResponse {
            job_id,
            status: "started",
        }),
    ))
}
