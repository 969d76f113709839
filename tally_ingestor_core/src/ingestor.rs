use std::{num::NonZeroUsize, sync::Arc};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tally_object_store::{BlobStore, Destination};
use tracing::debug;

use crate::{
    buffer::BatchBuffer,
    error::Result,
    event::EventRecord,
    flusher::{FlushResult, Flusher},
    metrics::IngestorMetrics,
};

/// Default number of buffered events that triggers a flush.
pub const DEFAULT_MAX_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(100).unwrap();

/// Accepts events into the buffer and flushes it once it is full.
#[derive(Clone)]
pub struct EventIngestor {
    buffer: BatchBuffer,
    flusher: Flusher,
    max_batch_size: NonZeroUsize,
    metrics: Arc<IngestorMetrics>,
}

/// Result of ingesting one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Buffer size after the event was handled.
    pub batch_size: usize,
    /// Set if the event filled the buffer and triggered a flush.
    pub flushed: Option<FlushResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestorStatus {
    pub batch_size: usize,
    pub max_batch_size: usize,
    pub destination: Destination,
}

impl EventIngestor {
    pub fn new(blob_store: Arc<dyn BlobStore>, max_batch_size: NonZeroUsize) -> Self {
        let flusher = Flusher::new_timestamped(BatchBuffer::new(), blob_store);
        Self::with_flusher(flusher, max_batch_size)
    }

    pub fn with_flusher(flusher: Flusher, max_batch_size: NonZeroUsize) -> Self {
        let metrics = Arc::new(IngestorMetrics::default());
        let flusher = flusher.with_metrics(metrics.clone());

        Self {
            buffer: flusher.buffer().clone(),
            flusher,
            max_batch_size,
            metrics,
        }
    }

    /// Validate, stamp and buffer one event.
    ///
    /// If the buffer reaches the threshold the flush runs before this returns,
    /// so its failure is reported to the caller. In that case the event is
    /// still buffered.
    pub async fn ingest(&self, payload: Value) -> Result<IngestOutcome> {
        let mut record = EventRecord::parse(payload).inspect_err(|_| {
            self.metrics.events_rejected.add(1, &[]);
        })?;
        record.stamp_received_at(Utc::now());

        let batch_size = self.buffer.append(record);
        self.metrics.events_received.add(1, &[]);

        if batch_size < self.max_batch_size.get() {
            return Ok(IngestOutcome {
                batch_size,
                flushed: None,
            });
        }

        debug!(batch_size, "batch threshold reached, flushing");
        let flushed = self.flusher.flush().await?;

        Ok(IngestOutcome {
            batch_size: self.buffer.size(),
            flushed: Some(flushed),
        })
    }

    /// Flush regardless of the buffer size.
    pub async fn flush(&self) -> Result<FlushResult> {
        self.flusher.flush().await
    }

    pub fn status(&self) -> IngestorStatus {
        IngestorStatus {
            batch_size: self.buffer.size(),
            max_batch_size: self.max_batch_size.get(),
            destination: self.flusher.destination().clone(),
        }
    }

    pub fn max_batch_size(&self) -> NonZeroUsize {
        self.max_batch_size
    }

    pub fn buffer(&self) -> &BatchBuffer {
        &self.buffer
    }

    pub fn flusher(&self) -> &Flusher {
        &self.flusher
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        error::IngestorError,
        test_utils::{event, new_test_ingestor},
    };

    #[tokio::test]
    async fn test_ingest_below_threshold_does_not_flush() {
        let (ingestor, store) = new_test_ingestor(3);

        let outcome = ingestor.ingest(event("a")).await.unwrap();
        assert_eq!(outcome.batch_size, 1);
        assert_eq!(outcome.flushed, None);

        let outcome = ingestor.ingest(event("b")).await.unwrap();
        assert_eq!(outcome.batch_size, 2);
        assert_eq!(store.attempts(), 0);
    }

    #[tokio::test]
    async fn test_ingest_at_threshold_flushes() {
        let (ingestor, store) = new_test_ingestor(3);
        ingestor.ingest(event("a")).await.unwrap();
        ingestor.ingest(event("b")).await.unwrap();

        let outcome = ingestor.ingest(event("c")).await.unwrap();

        assert_eq!(outcome.batch_size, 0);
        let flushed = outcome.flushed.unwrap();
        assert_eq!(flushed.count, 3);
        let key = flushed.key.unwrap();
        assert!(key.starts_with("events/batch-"));
        assert!(key.ends_with(".ndjson"));
        assert_eq!(store.puts().len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_stamps_received_at() {
        let (ingestor, store) = new_test_ingestor(1);

        ingestor
            .ingest(json!({ "name": "signup", "plan": "pro" }))
            .await
            .unwrap();

        let uploaded = store.records(0);
        assert_eq!(uploaded[0]["name"], "signup");
        assert_eq!(uploaded[0]["plan"], "pro");
        let received_at = uploaded[0]["receivedAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(received_at).is_ok());
        assert!(received_at.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_invalid_event_leaves_buffer_untouched() {
        let (ingestor, _store) = new_test_ingestor(3);
        ingestor.ingest(event("a")).await.unwrap();

        let err = ingestor.ingest(json!({ "name": "" })).await.unwrap_err();

        assert!(matches!(err, IngestorError::Validation { .. }));
        assert_eq!(ingestor.buffer().size(), 1);
    }

    #[tokio::test]
    async fn test_failed_threshold_flush_keeps_event() {
        let (ingestor, store) = new_test_ingestor(2);
        store.set_failing(true);
        ingestor.ingest(event("a")).await.unwrap();

        let err = ingestor.ingest(event("b")).await.unwrap_err();

        assert!(err.is_persistence());
        assert_eq!(ingestor.buffer().size(), 2);

        // Next ingestion retries with everything buffered so far.
        store.set_failing(false);
        let outcome = ingestor.ingest(event("c")).await.unwrap();
        assert_eq!(outcome.flushed.map(|f| f.count), Some(3));
    }

    #[tokio::test]
    async fn test_status() {
        let (ingestor, _store) = new_test_ingestor(10);
        ingestor.ingest(event("a")).await.unwrap();

        let status = ingestor.status();
        assert_eq!(status.batch_size, 1);
        assert_eq!(status.max_batch_size, 10);
        assert_eq!(status.destination.bucket, "test-bucket");
    }

    #[test]
    fn test_default_max_batch_size() {
        assert_eq!(DEFAULT_MAX_BATCH_SIZE.get(), 100);
    }
}
