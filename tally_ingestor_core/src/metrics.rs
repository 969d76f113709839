use tally_observability::{Counter, Histogram, counter, duration_histogram};

pub struct IngestorMetrics {
    pub events_received: Counter<u64>,
    pub events_rejected: Counter<u64>,
    pub flushed_events: Counter<u64>,
    pub flushed_bytes: Counter<u64>,
    pub flush_failures: Counter<u64>,
    pub flush_duration: Histogram<f64>,
}

impl Default for IngestorMetrics {
    fn default() -> Self {
        let meter = tally_observability::meter("ingestor");
        Self {
            events_received: counter(
                &meter,
                "ingestor.events.received",
                "{event}",
                "number of events accepted into the buffer",
            ),
            events_rejected: counter(
                &meter,
                "ingestor.events.rejected",
                "{event}",
                "number of events rejected by validation",
            ),
            flushed_events: counter(
                &meter,
                "ingestor.flush.events",
                "{event}",
                "number of events uploaded to the blob store",
            ),
            flushed_bytes: counter(
                &meter,
                "ingestor.flush.bytes",
                "By",
                "bytes uploaded to the blob store",
            ),
            flush_failures: counter(
                &meter,
                "ingestor.flush.failures",
                "{flush}",
                "number of failed batch uploads",
            ),
            flush_duration: duration_histogram(
                &meter,
                "ingestor.flush.duration",
                "time spent encoding and uploading a batch",
            ),
        }
    }
}
