use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use crate::event::format_timestamp;

/// Format the object key of a batch flushed at `started_at`.
///
/// `:` and `.` are replaced with `-`, e.g.
/// `events/batch-2024-05-01T12-30-45-123Z.ndjson`.
pub fn format_batch_key(started_at: DateTime<Utc>) -> String {
    let timestamp = format_timestamp(started_at).replace([':', '.'], "-");
    format!("events/batch-{timestamp}.ndjson")
}

/// Trait for generating the object key of a new batch.
pub trait BatchKeyGenerator: Send + Sync + 'static {
    fn generate_key(&self) -> String;
}

/// Generates keys from the current time.
///
/// Keys have millisecond resolution. If two flushes start within the same
/// millisecond the later one is moved to the next free millisecond, so keys
/// issued by one generator never collide.
#[derive(Debug, Default)]
pub struct TimestampKeyGenerator {
    last_issued_ms: AtomicI64,
}

impl TimestampKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_timestamp(&self, now_ms: i64) -> i64 {
        let previous = self
            .last_issued_ms
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now_ms.max(last + 1))
            })
            .unwrap_or_else(|last| last);

        now_ms.max(previous + 1)
    }
}

impl BatchKeyGenerator for TimestampKeyGenerator {
    fn generate_key(&self) -> String {
        let issued_ms = self.next_timestamp(Utc::now().timestamp_millis());
        let started_at = DateTime::<Utc>::from_timestamp_millis(issued_ms).unwrap_or_else(Utc::now);
        format_batch_key(started_at)
    }
}
