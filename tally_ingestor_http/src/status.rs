use axum::{Json, extract::State};

use crate::{HttpIngestorState, types::StatusResponse};

/// Handler for the /v1/status endpoint.
///
/// Read-only, served while draining too.
pub async fn status_handler(State(state): State<HttpIngestorState>) -> Json<StatusResponse> {
    Json(StatusResponse::new(
        state.ingestor.status(),
        state.shutdown.state(),
    ))
}
