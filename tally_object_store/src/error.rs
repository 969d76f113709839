use std::{sync::Arc, time::Duration};

use snafu::Snafu;
use tally_observability::ErrorKind;

/// Error returned by a single upload.
///
/// Cloneable so that it can be reported both to the caller and to the logs.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum BlobStoreError {
    #[snafu(display("failed to upload {key}"))]
    Put {
        key: String,
        #[snafu(source(from(object_store::Error, Arc::new)))]
        source: Arc<object_store::Error>,
    },
    #[snafu(display("upload of {key} timed out after {timeout:?}"))]
    Timeout { key: String, timeout: Duration },
}

/// Error returned while building a blob store from its configuration.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CreateBlobStoreError {
    #[snafu(display("Failed to create {store_type} object store: {message}"))]
    Creation {
        store_type: &'static str,
        message: String,
        source: object_store::Error,
    },
    #[snafu(display("Failed to prepare local directory {path}"))]
    LocalDirectory {
        path: String,
        source: std::io::Error,
    },
}

pub type Result<T, E = BlobStoreError> = std::result::Result<T, E>;

impl BlobStoreError {
    /// The key that failed to upload.
    pub fn key(&self) -> &str {
        match self {
            Self::Put { key, .. } | Self::Timeout { key, .. } => key,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Temporary
    }
}

impl CreateBlobStoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Creation { .. } => ErrorKind::Configuration,
            Self::LocalDirectory { .. } => ErrorKind::Configuration,
        }
    }
}
