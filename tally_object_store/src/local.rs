//! Local file system blob stores.
//!
//! `create_local_store` writes batches below a root directory, creating it if
//! needed. `TemporaryFileSystemStore` does the same inside a temporary
//! directory that is removed when the store is dropped, which is what
//! development and tests want.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use bytes::Bytes;
use object_store::local::LocalFileSystem;
use snafu::ResultExt;
use tempfile::TempDir;

use crate::{
    BlobStore, BlobStoreError, Destination, ObjectBlobStore,
    error::{CreateBlobStoreError, LocalDirectorySnafu},
};

#[derive(Debug, Clone)]
pub struct LocalConfiguration {
    pub root_path: PathBuf,
}

/// Create a blob store writing below `config.root_path`.
pub fn create_local_store(
    config: &LocalConfiguration,
) -> Result<ObjectBlobStore, CreateBlobStoreError> {
    let path = config.root_path.display().to_string();

    std::fs::create_dir_all(&config.root_path).context(LocalDirectorySnafu { path: &path })?;
    let root_path =
        std::fs::canonicalize(&config.root_path).context(LocalDirectorySnafu { path: &path })?;

    let local_fs = LocalFileSystem::new_with_prefix(&root_path).map_err(|e| {
        CreateBlobStoreError::Creation {
            store_type: "local file system",
            message: format!("invalid root {}", root_path.display()),
            source: e,
        }
    })?;

    let destination = Destination::new("local", root_path.display().to_string());

    // LocalFileSystem rejects object attributes.
    Ok(ObjectBlobStore::new(Arc::new(local_fs), destination).without_content_type_attribute())
}

/// Blob store backed by a temporary directory.
pub struct TemporaryFileSystemStore {
    temp_dir: TempDir,
    inner: ObjectBlobStore,
}

impl TemporaryFileSystemStore {
    pub fn new(timeout: Duration) -> Result<Self, CreateBlobStoreError> {
        let temp_dir = TempDir::new().context(LocalDirectorySnafu {
            path: "<temporary>",
        })?;

        let inner = create_local_store(&LocalConfiguration {
            root_path: temp_dir.path().to_path_buf(),
        })?
        .with_timeout(timeout);

        Ok(Self { temp_dir, inner })
    }

    pub fn root_path(&self) -> &Path {
        self.temp_dir.path()
    }
}

#[async_trait::async_trait]
impl BlobStore for TemporaryFileSystemStore {
    fn destination(&self) -> &Destination {
        self.inner.destination()
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), BlobStoreError> {
        self.inner.put(key, body, content_type).await
    }
}
