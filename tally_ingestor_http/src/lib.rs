//! HTTP ingestor server.
//!
//! This crate exposes the event ingestor over HTTP. The server is built
//! using axum and provides:
//!
//! - `POST /v1/events`: ingest one event.
//! - `POST /v1/flush`: flush the buffer now.
//! - `GET /v1/status`: buffer size and destination.

pub mod error;
pub mod events;
pub mod flush;
pub mod status;
pub mod types;

pub use error::{HttpIngestorError, Result};
pub use types::{ErrorResponse, FlushResponse, FlushedBatch, IngestResponse, StatusResponse};

use axum::{
    Router,
    routing::{get, post},
};
use tally_ingestor_core::{EventIngestor, IngestorError, ShutdownCoordinator};

use crate::{events::ingest_handler, flush::flush_handler, status::status_handler};

/// HTTP ingestor server that receives events via HTTP requests.
pub struct HttpIngestor {
    state: HttpIngestorState,
}

#[derive(Clone)]
pub struct HttpIngestorState {
    ingestor: EventIngestor,
    shutdown: ShutdownCoordinator,
}

impl HttpIngestor {
    pub fn new(ingestor: EventIngestor, shutdown: ShutdownCoordinator) -> Self {
        let state = HttpIngestorState { ingestor, shutdown };
        Self { state }
    }

    pub fn into_router(self) -> Router {
        Router::new()
            .route("/v1/events", post(ingest_handler))
            .route("/v1/flush", post(flush_handler))
            .route("/v1/status", get(status_handler))
            .with_state(self.state)
    }
}

impl HttpIngestorState {
    /// Reject work once shutdown started.
    fn ensure_accepting(&self) -> Result<()> {
        if self.shutdown.is_accepting() {
            Ok(())
        } else {
            Err(IngestorError::ShuttingDown.into())
        }
    }
}
