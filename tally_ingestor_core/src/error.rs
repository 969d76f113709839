use std::sync::Arc;

use snafu::Snafu;
use tally_object_store::BlobStoreError;
use tally_observability::ErrorKind;

/// Ingestor error types.
///
/// The message associated with an error is forwarded to the client,
/// for this reason it should contain information that is useful to the user.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum IngestorError {
    /// Validation error.
    ///
    /// The event was rejected before reaching the buffer.
    #[snafu(display("validation error: {message}"))]
    Validation { message: String },
    /// Persistence error.
    ///
    /// The batch could not be uploaded. Its events are back in the buffer.
    #[snafu(display("failed to persist {count} events to {key}: {source}"))]
    Persistence {
        key: String,
        count: usize,
        source: BlobStoreError,
    },
    /// The final flush before exit failed. Its events are lost.
    #[snafu(display("final flush of {count} events to {key} failed: {source}"))]
    ShutdownFlush {
        key: String,
        count: usize,
        source: BlobStoreError,
    },
    #[snafu(display("failed to encode batch"))]
    Encode {
        #[snafu(source(from(serde_json::Error, Arc::new)))]
        source: Arc<serde_json::Error>,
    },
    /// The ingestor stopped accepting requests.
    #[snafu(display("ingestor is shutting down"))]
    ShuttingDown,
}

pub type Result<T, E = IngestorError> = std::result::Result<T, E>;

impl IngestorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Persistence { .. } | Self::ShutdownFlush { .. } => ErrorKind::Temporary,
            Self::Encode { .. } => ErrorKind::Internal,
            Self::ShuttingDown => ErrorKind::Unavailable,
        }
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
