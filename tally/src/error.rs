use std::net::AddrParseError;

use axum::http::StatusCode;
use snafu::Snafu;
use tally_object_store::CreateBlobStoreError;
use tally_observability::ErrorKind;
use tally_push_client::HttpPushClientError;

/// CLI error types.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CliError {
    #[snafu(display("Invalid {name} argument: {message}"))]
    InvalidArgument { name: &'static str, message: String },
    #[snafu(display("Missing {name} for the {store} store"))]
    MissingStoreArgument {
        name: &'static str,
        store: &'static str,
    },
    #[snafu(display("Failed to create blob store"))]
    BlobStore { source: CreateBlobStoreError },
    #[snafu(display("Failed to initialize observability"))]
    Observability {
        source: tally_observability::ObservabilityError,
    },
    #[snafu(display("IO error"))]
    Io { source: std::io::Error },
    #[snafu(display("Invalid server address"))]
    InvalidServerAddress { source: AddrParseError },
    #[snafu(display("Push client error"))]
    PushClient { source: HttpPushClientError },
    #[snafu(display("JSON parse error"))]
    JsonParse { source: serde_json::Error },
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

impl CliError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } | Self::JsonParse { .. } => ErrorKind::Validation,
            Self::MissingStoreArgument { .. } | Self::InvalidServerAddress { .. } => {
                ErrorKind::Configuration
            }
            Self::BlobStore { source } => source.kind(),
            Self::Observability { .. } => ErrorKind::Internal,
            Self::Io { .. } => ErrorKind::Unavailable,
            Self::PushClient { source } => match source {
                HttpPushClientError::Request { .. } => ErrorKind::Unavailable,
                HttpPushClientError::Response { status, .. } if status.is_client_error() => {
                    ErrorKind::Validation
                }
                HttpPushClientError::Response { status, .. }
                    if *status == StatusCode::SERVICE_UNAVAILABLE =>
                {
                    ErrorKind::Unavailable
                }
                HttpPushClientError::Response { .. } => ErrorKind::Temporary,
            },
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }
}
