//! HTTP API for the assessment pipeline engine

pub mod generate;
pub mod health;
pub mod progress;
pub mod records;
pub mod schema;

use crate::AppState;
use axum::routing::{get, post, put};
use axum::Router;

/// Build all engine routes
pub fn routes() -> Router<AppState> {
    Router::new()
        // Generation triggers
        .route(
            "/verticals/:vertical_id/matrix/generate",
            post(generate::generate_matrix),
        )
        .route(
            "/verticals/:vertical_id/dfd/generate",
            post(generate::generate_dfd),
        )
        // Job tracking
        .route("/jobs/:job_id", get(progress::job_status))
        .route("/jobs/:job_id/events", get(progress::job_event_stream))
        // Structured schema + deterministic render
        .route(
            "/verticals/:vertical_id/schema",
            put(schema::put_schema).get(schema::get_schema),
        )
        .route(
            "/verticals/:vertical_id/schema/generate",
            post(schema::generate_schema),
        )
        .route(
            "/verticals/:vertical_id/dfd/render",
            post(schema::render_dfd),
        )
        // Boundary records + artifacts
        .route("/verticals", post(records::create_vertical))
        .route("/verticals/:vertical_id", get(records::get_vertical))
        .route(
            "/verticals/:vertical_id/sessions",
            post(records::create_session),
        )
        .route("/verticals/:vertical_id/matrix", get(records::get_matrix))
        .route("/verticals/:vertical_id/dfd", get(records::get_dfd))
        // Health
        .route("/health", get(health::health_check))
}
