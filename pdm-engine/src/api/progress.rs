//! Server-Sent Events (SSE) for job progress streaming
//!
//! A new subscriber first receives the job's full progress history, then
//! live events; the stream ends after the first `done` or `error` step.

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use pdm_common::events::ProgressEvent;
use pdm_common::jobs::JobSnapshot;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /jobs/{job_id} - point-in-time job snapshot
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobSnapshot>> {
    state
        .jobs
        .get(&job_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {}", job_id)))
}

/// GET /jobs/{job_id}/events - SSE progress stream
///
/// Replays history before attaching live, so a late subscriber never
/// misses already-emitted events.
pub async fn job_event_stream(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let subscription = state
        .jobs
        .subscribe(&job_id)
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {}", job_id)))?;

    info!(job_id = %job_id, "New SSE client connected to job events");

    let stream = async_stream::stream! {
        let history = subscription.history;
        let mut live = subscription.live;

        for event in history {
            let terminal = event.is_terminal();
            if let Some(sse) = to_sse_event(&event) {
                yield Ok(sse);
            }
            if terminal {
                debug!(job_id = %job_id, "Replayed history ended with terminal event");
                return;
            }
        }

        loop {
            match live.recv().await {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    if let Some(sse) = to_sse_event(&event) {
                        yield Ok(sse);
                    }
                    if terminal {
                        debug!(job_id = %job_id, "Job stream terminated");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(job_id = %job_id, skipped = skipped, "SSE subscriber lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(job_id = %job_id, "Job progress channel closed");
                    break;
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    ))
}

fn to_sse_event(event: &ProgressEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event("progress").data(json)),
        Err(e) => {
            warn!(error = %e, "Failed to serialize progress event");
            None
        }
    }
}
