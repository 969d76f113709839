use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::{
    HttpIngestorState,
    error::{HttpIngestorError, Result},
    types::IngestResponse,
};

/// Handler for the /v1/events endpoint.
pub async fn ingest_handler(
    State(state): State<HttpIngestorState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Response {
    match process_ingest_request(&state, payload).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn process_ingest_request(
    state: &HttpIngestorState,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<IngestResponse> {
    state.ensure_accepting()?;

    let Json(payload) = payload.map_err(|err| HttpIngestorError::BadRequest {
        message: format!("invalid JSON body: {}", err.body_text()),
    })?;

    let outcome = state.ingestor.ingest(payload).await?;

    Ok(outcome.into())
}
