//! Request and response types of the HTTP ingestor.

use serde::{Deserialize, Serialize};
use tally_ingestor_core::{FlushResult, IngestOutcome, IngestorStatus, ShutdownState};

/// Response payload for the /v1/events endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    /// Number of buffered events after this one was handled.
    pub batch_size: usize,
    /// The flush triggered by this event, if any.
    pub flushed: Option<FlushedBatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlushedBatch {
    pub success: bool,
    pub count: usize,
    pub key: Option<String>,
}

/// Response payload for the /v1/flush endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlushResponse {
    pub success: bool,
    /// Number of events uploaded.
    pub flushed: usize,
    /// Object key, `None` if there was nothing to flush.
    pub filename: Option<String>,
    pub bucket: Option<String>,
}

/// Response payload for the /v1/status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub batch_size: usize,
    pub max_batch_size: usize,
    pub provider: String,
    pub bucket: String,
    pub region: Option<String>,
    pub state: String,
}

/// Response payload for errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<FlushResult> for FlushedBatch {
    fn from(result: FlushResult) -> Self {
        Self {
            success: true,
            count: result.count,
            key: result.key,
        }
    }
}

impl From<IngestOutcome> for IngestResponse {
    fn from(outcome: IngestOutcome) -> Self {
        Self {
            success: true,
            batch_size: outcome.batch_size,
            flushed: outcome.flushed.map(Into::into),
        }
    }
}

impl FlushResponse {
    pub fn new(result: FlushResult, bucket: &str) -> Self {
        let bucket = result.key.as_ref().map(|_| bucket.to_string());
        Self {
            success: true,
            flushed: result.count,
            filename: result.key,
            bucket,
        }
    }
}

impl StatusResponse {
    pub fn new(status: IngestorStatus, state: ShutdownState) -> Self {
        Self {
            batch_size: status.batch_size,
            max_batch_size: status.max_batch_size,
            provider: status.destination.provider.to_string(),
            bucket: status.destination.bucket,
            region: status.destination.region,
            state: state.to_string(),
        }
    }
}
