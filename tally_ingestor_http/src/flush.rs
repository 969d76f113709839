use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::{HttpIngestorState, error::Result, types::FlushResponse};

/// Handler for the /v1/flush endpoint.
pub async fn flush_handler(State(state): State<HttpIngestorState>) -> Response {
    match process_flush_request(&state).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn process_flush_request(state: &HttpIngestorState) -> Result<FlushResponse> {
    state.ensure_accepting()?;

    let result = state.ingestor.flush().await?;
    info!(count = result.count, key = ?result.key, "manual flush completed");

    let status = state.ingestor.status();
    Ok(FlushResponse::new(result, &status.destination.bucket))
}
