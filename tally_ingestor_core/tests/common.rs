use std::{num::NonZeroUsize, sync::Arc};

use tally_ingestor_core::{EventIngestor, test_utils::RecordingBlobStore};
use tally_object_store::BlobStore;

pub fn create_ingestor(max_batch_size: usize) -> (EventIngestor, Arc<RecordingBlobStore>) {
    let store = Arc::new(RecordingBlobStore::new());
    let ingestor = create_ingestor_with_store(store.clone(), max_batch_size);
    (ingestor, store)
}

pub fn create_ingestor_with_store(
    store: Arc<dyn BlobStore>,
    max_batch_size: usize,
) -> EventIngestor {
    let max_batch_size = NonZeroUsize::new(max_batch_size).expect("positive batch size");
    EventIngestor::new(store, max_batch_size)
}
