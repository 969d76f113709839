use std::{sync::Arc, time::Instant};

use serde::Serialize;
use tally_object_store::{BlobStore, Destination};
use tracing::{debug, warn};

use crate::{
    buffer::BatchBuffer,
    error::{IngestorError, Result},
    metrics::IngestorMetrics,
    ndjson::{NDJSON_CONTENT_TYPE, encode_ndjson},
    paths::{BatchKeyGenerator, TimestampKeyGenerator},
};

/// Outcome of a successful flush.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlushResult {
    /// Number of events uploaded.
    pub count: usize,
    /// Key of the uploaded object, `None` if there was nothing to flush.
    pub key: Option<String>,
}

impl FlushResult {
    pub fn empty() -> Self {
        Self {
            count: 0,
            key: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Moves buffered events to the blob store.
///
/// A flush drains the buffer first and uploads afterwards, so ingestion is
/// never blocked by the upload. If the upload fails the drained events are
/// put back in front of the buffer.
#[derive(Clone)]
pub struct Flusher {
    buffer: BatchBuffer,
    blob_store: Arc<dyn BlobStore>,
    key_generator: Arc<dyn BatchKeyGenerator>,
    metrics: Arc<IngestorMetrics>,
}

impl Flusher {
    pub fn new(
        buffer: BatchBuffer,
        blob_store: Arc<dyn BlobStore>,
        key_generator: Arc<dyn BatchKeyGenerator>,
    ) -> Self {
        Self {
            buffer,
            blob_store,
            key_generator,
            metrics: Default::default(),
        }
    }

    pub fn new_timestamped(buffer: BatchBuffer, blob_store: Arc<dyn BlobStore>) -> Self {
        Self::new(buffer, blob_store, Arc::new(TimestampKeyGenerator::new()))
    }

    pub(crate) fn with_metrics(mut self, metrics: Arc<IngestorMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn buffer(&self) -> &BatchBuffer {
        &self.buffer
    }

    pub fn destination(&self) -> &Destination {
        self.blob_store.destination()
    }

    /// Upload everything currently buffered as one NDJSON object.
    ///
    /// An empty buffer never touches the blob store.
    pub async fn flush(&self) -> Result<FlushResult> {
        let events = self.buffer.drain();
        if events.is_empty() {
            debug!("nothing to flush");
            return Ok(FlushResult::empty());
        }

        let count = events.len();
        let key = self.key_generator.generate_key();
        let started = Instant::now();

        let body = match encode_ndjson(&events) {
            Ok(body) => body,
            Err(err) => {
                self.buffer.restore(events);
                self.metrics.flush_failures.add(1, &[]);
                return Err(IngestorError::Encode {
                    source: Arc::new(err),
                });
            }
        };

        let size_bytes = body.len() as u64;

        let result = self.blob_store.put(&key, body, NDJSON_CONTENT_TYPE).await;
        self.metrics
            .flush_duration
            .record(started.elapsed().as_secs_f64(), &[]);

        match result {
            Ok(()) => {
                self.metrics.flushed_events.add(count as u64, &[]);
                self.metrics.flushed_bytes.add(size_bytes, &[]);
                debug!(count, key = %key, size_bytes, "batch flushed");

                Ok(FlushResult {
                    count,
                    key: Some(key),
                })
            }
            Err(err) => {
                self.buffer.restore(events);
                self.metrics.flush_failures.add(1, &[]);
                warn!(count, key = %key, err = ?err, "batch upload failed, events restored");

                Err(IngestorError::Persistence {
                    key,
                    count,
                    source: err,
                })
            }
        }
    }
}
