//! Cloud blob stores.
//!
//! Builds `ObjectBlobStore`s for AWS S3, S3-compatible storage (MinIO, R2, ...),
//! Azure Blob Storage and Google Cloud Storage using the object_store crate
//! builders.

use std::sync::Arc;

use object_store::{ObjectStore, aws::AmazonS3Builder, prefix::PrefixStore};

use crate::{Destination, ObjectBlobStore, error::CreateBlobStoreError};

type Result<T, E = CreateBlobStoreError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Default)]
pub struct AwsConfiguration {
    pub bucket_name: String,
    pub prefix: Option<String>,
    /// Falls back to the `AWS_*` environment when unset.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct S3CompatibleConfiguration {
    pub bucket_name: String,
    pub prefix: Option<String>,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: Option<String>,
    pub allow_http: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AzureConfiguration {
    pub container_name: String,
    pub prefix: Option<String>,
    pub storage_account_name: String,
    pub storage_account_key: String,
}

#[derive(Debug, Clone, Default)]
pub struct GoogleConfiguration {
    pub bucket_name: String,
    pub prefix: Option<String>,
    pub service_account_key: String,
}

/// Create AWS S3 blob store
pub fn create_aws_s3_store(config: &AwsConfiguration) -> Result<ObjectBlobStore> {
    let mut builder = AmazonS3Builder::from_env().with_bucket_name(&config.bucket_name);

    if let Some(access_key_id) = &config.access_key_id {
        builder = builder.with_access_key_id(access_key_id);
    }

    if let Some(secret_access_key) = &config.secret_access_key {
        builder = builder.with_secret_access_key(secret_access_key);
    }

    if let Some(region) = &config.region {
        builder = builder.with_region(region);
    }

    let store = builder.build().map_err(|e| CreateBlobStoreError::Creation {
        store_type: "AWS S3",
        message: "Failed to build AWS S3 object store".to_string(),
        source: e,
    })?;

    let destination =
        Destination::new("aws", &config.bucket_name).with_region(config.region.clone());

    Ok(ObjectBlobStore::new(
        with_prefix(store, config.prefix.as_deref()),
        destination,
    ))
}

/// Create S3-compatible blob store
pub fn create_s3_compatible_store(config: &S3CompatibleConfiguration) -> Result<ObjectBlobStore> {
    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(&config.bucket_name)
        .with_access_key_id(&config.access_key_id)
        .with_secret_access_key(&config.secret_access_key)
        .with_endpoint(&config.endpoint);

    if let Some(region) = &config.region {
        builder = builder.with_region(region);
    }

    // Allow HTTP for S3-compatible storage (like MinIO)
    builder = builder.with_allow_http(config.allow_http);

    let store = builder.build().map_err(|e| CreateBlobStoreError::Creation {
        store_type: "S3-compatible",
        message: "Failed to build S3-compatible object store".to_string(),
        source: e,
    })?;

    let destination =
        Destination::new("s3", &config.bucket_name).with_region(config.region.clone());

    Ok(ObjectBlobStore::new(
        with_prefix(store, config.prefix.as_deref()),
        destination,
    ))
}

/// Create Azure Blob Storage blob store
pub fn create_azure_blob_store(config: &AzureConfiguration) -> Result<ObjectBlobStore> {
    use object_store::azure::MicrosoftAzureBuilder;

    let builder = MicrosoftAzureBuilder::new()
        .with_container_name(&config.container_name)
        .with_account(&config.storage_account_name)
        .with_access_key(&config.storage_account_key);

    let store = builder.build().map_err(|e| CreateBlobStoreError::Creation {
        store_type: "Azure Blob Storage",
        message: "Failed to build Azure Blob Storage object store".to_string(),
        source: e,
    })?;

    let destination = Destination::new("azure", &config.container_name);

    Ok(ObjectBlobStore::new(
        with_prefix(store, config.prefix.as_deref()),
        destination,
    ))
}

/// Create Google Cloud Storage blob store
pub fn create_google_cloud_store(config: &GoogleConfiguration) -> Result<ObjectBlobStore> {
    use object_store::gcp::GoogleCloudStorageBuilder;

    let builder = GoogleCloudStorageBuilder::new()
        .with_bucket_name(&config.bucket_name)
        .with_service_account_key(&config.service_account_key);

    let store = builder.build().map_err(|e| CreateBlobStoreError::Creation {
        store_type: "Google Cloud Storage",
        message: "Failed to build Google Cloud Storage object store".to_string(),
        source: e,
    })?;

    let destination = Destination::new("google", &config.bucket_name);

    Ok(ObjectBlobStore::new(
        with_prefix(store, config.prefix.as_deref()),
        destination,
    ))
}

fn with_prefix<T: ObjectStore>(store: T, prefix: Option<&str>) -> Arc<dyn ObjectStore> {
    match prefix {
        Some(prefix) => Arc::new(PrefixStore::new(store, prefix)),
        None => Arc::new(store),
    }
}
