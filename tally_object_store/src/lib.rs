//! Blob store used to persist event batches.
//!
//! The ingestor only needs put-object semantics: upload a body under a key
//! with a content type. The [`BlobStore`] trait captures that capability and
//! [`ObjectBlobStore`] implements it on top of any `object_store::ObjectStore`,
//! adding the upload timeout. The store itself never retries.
//!
//! Concrete backends are built from a [`BlobStoreConfiguration`] with
//! [`create_blob_store`].

pub mod cloud;
pub mod error;
pub mod local;

use std::{fmt, sync::Arc, time::Duration};

use bytes::Bytes;
use object_store::{
    Attribute, Attributes, ObjectStore, PutOptions, PutPayload, memory::InMemory, path::Path,
};
use serde::Serialize;

pub use self::cloud::{
    AwsConfiguration, AzureConfiguration, GoogleConfiguration, S3CompatibleConfiguration,
};
pub use self::error::{BlobStoreError, CreateBlobStoreError, Result};
pub use self::local::{LocalConfiguration, TemporaryFileSystemStore};

/// Default timeout for a single upload.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Put-object capability of a blob store.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Where objects end up, for reporting purposes.
    fn destination(&self) -> &Destination;

    /// Upload `body` under `key`.
    ///
    /// A timeout is reported as an error like any other failure.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), BlobStoreError>;
}

/// Identity of the place batches are written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    /// Backend type, e.g. `aws` or `local`.
    pub provider: &'static str,
    /// Bucket, container or root directory.
    pub bucket: String,
    pub region: Option<String>,
}

impl Destination {
    pub fn new(provider: &'static str, bucket: impl Into<String>) -> Self {
        Self {
            provider,
            bucket: bucket.into(),
            region: None,
        }
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}://{} ({})", self.provider, self.bucket, region),
            None => write!(f, "{}://{}", self.provider, self.bucket),
        }
    }
}

/// [`BlobStore`] backed by an `object_store::ObjectStore`.
#[derive(Clone)]
pub struct ObjectBlobStore {
    store: Arc<dyn ObjectStore>,
    destination: Destination,
    timeout: Duration,
    content_type_attribute: bool,
}

impl ObjectBlobStore {
    pub fn new(store: Arc<dyn ObjectStore>, destination: Destination) -> Self {
        Self {
            store,
            destination,
            timeout: DEFAULT_UPLOAD_TIMEOUT,
            content_type_attribute: true,
        }
    }

    /// An in-memory store, useful for development and tests.
    pub fn new_in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), Destination::new("memory", "memory"))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Don't send the content type as an object attribute.
    ///
    /// Needed for backends that reject attributes, such as the local file system.
    pub fn without_content_type_attribute(mut self) -> Self {
        self.content_type_attribute = false;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The underlying object store.
    pub fn inner(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}

#[async_trait::async_trait]
impl BlobStore for ObjectBlobStore {
    fn destination(&self) -> &Destination {
        &self.destination
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), BlobStoreError> {
        let mut attributes = Attributes::new();
        if self.content_type_attribute {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
        }

        let location = Path::from(key);
        let upload = self.store.put_opts(
            &location,
            PutPayload::from_bytes(body),
            PutOptions {
                attributes,
                ..Default::default()
            },
        );

        match tokio::time::timeout(self.timeout, upload).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(BlobStoreError::Put {
                key: key.to_string(),
                source: Arc::new(err),
            }),
            Err(_) => Err(BlobStoreError::Timeout {
                key: key.to_string(),
                timeout: self.timeout,
            }),
        }
    }
}

/// Configuration of the backend batches are written to.
#[derive(Debug, Clone)]
pub enum BlobStoreConfiguration {
    Aws(AwsConfiguration),
    S3Compatible(S3CompatibleConfiguration),
    Azure(AzureConfiguration),
    Google(GoogleConfiguration),
    Local(LocalConfiguration),
    /// Local file system rooted in a temporary directory, removed on drop.
    Temporary,
    Memory,
}

/// Build the blob store described by `config`.
pub fn create_blob_store(
    config: &BlobStoreConfiguration,
    timeout: Duration,
) -> Result<Arc<dyn BlobStore>, CreateBlobStoreError> {
    let store: Arc<dyn BlobStore> = match config {
        BlobStoreConfiguration::Aws(config) => {
            Arc::new(cloud::create_aws_s3_store(config)?.with_timeout(timeout))
        }
        BlobStoreConfiguration::S3Compatible(config) => {
            Arc::new(cloud::create_s3_compatible_store(config)?.with_timeout(timeout))
        }
        BlobStoreConfiguration::Azure(config) => {
            Arc::new(cloud::create_azure_blob_store(config)?.with_timeout(timeout))
        }
        BlobStoreConfiguration::Google(config) => {
            Arc::new(cloud::create_google_cloud_store(config)?.with_timeout(timeout))
        }
        BlobStoreConfiguration::Local(config) => {
            Arc::new(local::create_local_store(config)?.with_timeout(timeout))
        }
        BlobStoreConfiguration::Temporary => {
            Arc::new(TemporaryFileSystemStore::new(timeout)?)
        }
        BlobStoreConfiguration::Memory => {
            Arc::new(ObjectBlobStore::new_in_memory().with_timeout(timeout))
        }
    };

    Ok(store)
}
