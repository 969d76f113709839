//! Helpers shared by unit and integration tests.

use std::{
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tally_object_store::{BlobStore, BlobStoreError, Destination};

use crate::{event::EventRecord, ingestor::EventIngestor, ndjson::decode_ndjson};

/// A successful upload seen by [`RecordingBlobStore`].
#[derive(Debug, Clone)]
pub struct RecordedPut {
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
}

/// Blob store that keeps uploads in memory.
///
/// Failures and latency can be switched on at runtime to simulate an outage.
pub struct RecordingBlobStore {
    destination: Destination,
    puts: Mutex<Vec<RecordedPut>>,
    attempts: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingBlobStore {
    pub fn new() -> Self {
        Self {
            destination: Destination::new("memory", "test-bucket")
                .with_region(Some("test-region".to_string())),
            puts: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay: Mutex::new(None),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Number of calls to `put`, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> Vec<RecordedPut> {
        self.puts.lock().clone()
    }

    /// Decoded lines of the `index`-th successful upload.
    pub fn records(&self, index: usize) -> Vec<Value> {
        let puts = self.puts.lock();
        decode_ndjson(&puts[index].body).expect("uploaded body is valid ndjson")
    }
}

impl Default for RecordingBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BlobStore for RecordingBlobStore {
    fn destination(&self) -> &Destination {
        &self.destination
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), BlobStoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(BlobStoreError::Timeout {
                key: key.to_string(),
                timeout: Duration::ZERO,
            });
        }

        self.puts.lock().push(RecordedPut {
            key: key.to_string(),
            body,
            content_type: content_type.to_string(),
        });

        Ok(())
    }
}

/// A minimal valid event payload.
pub fn event(name: &str) -> Value {
    json!({ "name": name })
}

/// A validated record without `receivedAt`.
pub fn record(name: &str) -> EventRecord {
    EventRecord::parse(event(name)).expect("valid event")
}

/// An ingestor writing to a fresh [`RecordingBlobStore`].
pub fn new_test_ingestor(max_batch_size: usize) -> (EventIngestor, Arc<RecordingBlobStore>) {
    let store = Arc::new(RecordingBlobStore::new());
    let max_batch_size = NonZeroUsize::new(max_batch_size).expect("positive batch size");
    let ingestor = EventIngestor::new(store.clone(), max_batch_size);
    (ingestor, store)
}
