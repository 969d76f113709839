pub mod buffer;
pub mod error;
pub mod event;
pub mod flusher;
pub mod ingestor;
pub mod metrics;
pub mod ndjson;
pub mod paths;
pub mod shutdown;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use buffer::BatchBuffer;
pub use error::{IngestorError, Result};
pub use event::EventRecord;
pub use flusher::{FlushResult, Flusher};
pub use ingestor::{DEFAULT_MAX_BATCH_SIZE, EventIngestor, IngestOutcome, IngestorStatus};
pub use paths::{BatchKeyGenerator, TimestampKeyGenerator};
pub use shutdown::{ShutdownCoordinator, ShutdownState};
