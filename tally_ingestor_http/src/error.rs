use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tally_ingestor_core::IngestorError;
use tally_observability::ErrorKind;
use thiserror::Error;
use tracing::warn;

use crate::types::ErrorResponse;

/// Errors that can occur in the HTTP ingestor.
///
/// The message is sent to the client in the `error` field.
#[derive(Error, Debug)]
pub enum HttpIngestorError {
    #[error("{message}")]
    BadRequest { message: String },
    #[error("{message}")]
    Persistence { message: String },
    #[error("{message}")]
    Unavailable { message: String },
    #[error("{message}")]
    Internal { message: String },
}

pub type Result<T, E = HttpIngestorError> = std::result::Result<T, E>;

impl HttpIngestorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Persistence { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<IngestorError> for HttpIngestorError {
    fn from(err: IngestorError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::BadRequest { message },
            ErrorKind::Unavailable => Self::Unavailable { message },
            _ if err.is_persistence() => Self::Persistence { message },
            _ => Self::Internal { message },
        }
    }
}

impl IntoResponse for HttpIngestorError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            warn!(status = %status_code, err = %self, "request failed");
        }

        let response = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status_code, response).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err: HttpIngestorError = IngestorError::Validation {
            message: "event name is required".to_string(),
        }
        .into();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "validation error: event name is required");
    }

    #[test]
    fn test_shutting_down_maps_to_unavailable() {
        let err: HttpIngestorError = IngestorError::ShuttingDown.into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
