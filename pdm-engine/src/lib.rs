//! pdm-engine - Assessment Pipeline Microservice
//!
//! Converts interview transcripts into a structured, risk-scored privacy
//! data inventory and a derived data flow diagram. Pipelines run as
//! tracked jobs with SSE progress streaming.

pub mod api;
pub mod db;
pub mod diagram;
pub mod error;
pub mod genai;
pub mod models;
pub mod pipeline;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use pdm_common::jobs::JobRegistry;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::genai::GenerationClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Job registry for asynchronous generation runs
    pub jobs: JobRegistry,
    /// Structured generation client; `None` when no provider key is
    /// configured (deterministic endpoints still work)
    pub generation: Option<Arc<GenerationClient>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, jobs: JobRegistry, generation: Option<Arc<GenerationClient>>) -> Self {
        Self {
            db,
            jobs,
            generation,
            startup_time: Utc::now(),
        }
    }

    /// Generation client or a descriptive error for AI-assisted endpoints
    pub fn generation_client(&self) -> ApiResult<Arc<GenerationClient>> {
        self.generation.clone().ok_or_else(|| {
            ApiError::Internal(
                "No generation API key configured (set ANTHROPIC_API_KEY or OPENAI_API_KEY)"
                    .to_string(),
            )
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    api::routes().with_state(state)
}
