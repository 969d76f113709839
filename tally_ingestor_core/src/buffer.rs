//! In-memory buffer of events waiting to be flushed.
//!
//! The buffer is shared between request handlers and the flusher. Every
//! operation takes the lock exactly once, does a bounded amount of in-memory
//! work and releases it, so no caller ever observes a half-applied append,
//! drain or restore. The lock is never held across an `.await`.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::EventRecord;

/// Ordered, append-only sequence of events.
///
/// Cloning the buffer returns another handle to the same events.
#[derive(Debug, Clone, Default)]
pub struct BatchBuffer {
    events: Arc<Mutex<Vec<EventRecord>>>,
}

impl BatchBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event and return the buffer size right after the append.
    pub fn append(&self, record: EventRecord) -> usize {
        let mut events = self.events.lock();
        events.push(record);
        events.len()
    }

    pub fn size(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Take all buffered events, leaving the buffer empty.
    pub fn drain(&self) -> Vec<EventRecord> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Put previously drained events back in front of the buffer.
    ///
    /// Events appended since the drain stay after the restored ones.
    pub fn restore(&self, records: Vec<EventRecord>) {
        if records.is_empty() {
            return;
        }

        let mut events = self.events.lock();
        let newer = std::mem::replace(&mut *events, records);
        events.extend(newer);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::test_utils::record;

    fn names(records: &[EventRecord]) -> Vec<&str> {
        records.iter().map(EventRecord::name).collect()
    }

    #[test]
    fn test_append_and_drain_in_order() {
        let buffer = BatchBuffer::new();

        for (i, name) in ["a", "b", "c", "d"].into_iter().enumerate() {
            assert_eq!(buffer.append(record(name)), i + 1);
        }

        assert_eq!(buffer.size(), 4);
        let drained = buffer.drain();
        assert_eq!(names(&drained), vec!["a", "b", "c", "d"]);
        assert_eq!(buffer.size(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_drain_empty_buffer() {
        let buffer = BatchBuffer::new();
        assert!(buffer.drain().is_empty());
        assert_eq!(buffer.size(), 0);
    }

    #[test]
    fn test_restore_goes_before_newer_events() {
        let buffer = BatchBuffer::new();
        buffer.append(record("a"));
        buffer.append(record("b"));

        let drained = buffer.drain();
        buffer.append(record("c"));
        buffer.restore(drained);

        assert_eq!(names(&buffer.drain()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_restore_nothing_is_noop() {
        let buffer = BatchBuffer::new();
        buffer.append(record("a"));
        buffer.restore(Vec::new());
        assert_eq!(names(&buffer.drain()), vec!["a"]);
    }

    #[test]
    fn test_clones_share_events() {
        let buffer = BatchBuffer::new();
        let other = buffer.clone();
        buffer.append(record("a"));
        assert_eq!(other.size(), 1);

        let independent = BatchBuffer::new();
        assert_eq!(independent.size(), 0);
    }

    #[test]
    fn test_concurrent_append_and_drain_lose_nothing() {
        const WRITERS: usize = 4;
        const PER_WRITER: usize = 500;

        let buffer = BatchBuffer::new();

        let drained = std::thread::scope(|scope| {
            for writer in 0..WRITERS {
                let buffer = buffer.clone();
                scope.spawn(move || {
                    for i in 0..PER_WRITER {
                        buffer.append(record(&format!("{writer}-{i}")));
                    }
                });
            }

            let drainer = scope.spawn(|| {
                let mut drained = Vec::new();
                for _ in 0..200 {
                    drained.extend(buffer.drain());
                    std::thread::yield_now();
                }
                drained
            });

            drainer.join().unwrap()
        });

        let mut seen = HashSet::new();
        for record in drained.iter().chain(buffer.drain().iter()) {
            assert!(seen.insert(record.name().to_string()), "duplicate event");
        }
        assert_eq!(seen.len(), WRITERS * PER_WRITER);
    }

    #[test]
    fn test_concurrent_drains_preserve_per_writer_order() {
        let buffer = BatchBuffer::new();

        let batches = std::thread::scope(|scope| {
            let writer = {
                let buffer = buffer.clone();
                scope.spawn(move || {
                    for i in 0..1000 {
                        buffer.append(record(&i.to_string()));
                    }
                })
            };

            let mut batches = Vec::new();
            while !writer.is_finished() {
                batches.push(buffer.drain());
            }
            batches.push(buffer.drain());
            batches
        });

        let all: Vec<usize> = batches
            .iter()
            .flatten()
            .map(|r| r.name().parse().unwrap())
            .collect();
        assert_eq!(all, (0..1000).collect::<Vec<_>>());
    }
}
