use std::path::PathBuf;

use clap::{Args, ValueEnum};
use snafu::OptionExt;
use tally_object_store::{
    AwsConfiguration, AzureConfiguration, BlobStoreConfiguration, GoogleConfiguration,
    LocalConfiguration, S3CompatibleConfiguration,
};

use crate::error::{MissingStoreArgumentSnafu, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Aws,
    S3Compatible,
    Azure,
    Google,
    Local,
    Temporary,
    Memory,
}

impl StoreKind {
    /// Whether written batches outlive the process.
    pub fn is_durable(&self) -> bool {
        !matches!(self, StoreKind::Temporary | StoreKind::Memory)
    }

    fn name(&self) -> &'static str {
        match self {
            StoreKind::Aws => "aws",
            StoreKind::S3Compatible => "s3-compatible",
            StoreKind::Azure => "azure",
            StoreKind::Google => "google",
            StoreKind::Local => "local",
            StoreKind::Temporary => "temporary",
            StoreKind::Memory => "memory",
        }
    }
}

/// Arguments selecting where batches are written.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Storage backend.
    ///
    /// `temporary` and `memory` discard every batch when the process exits.
    #[arg(long, value_enum, env = "TALLY_STORE")]
    pub store: StoreKind,
    /// Bucket or container name.
    #[arg(long, env = "TALLY_BUCKET")]
    pub bucket: Option<String>,
    #[arg(long, env = "TALLY_REGION")]
    pub region: Option<String>,
    /// Endpoint of an S3-compatible service.
    #[arg(long, env = "TALLY_ENDPOINT")]
    pub endpoint: Option<String>,
    /// Prefix prepended to every object key.
    #[arg(long, env = "TALLY_PREFIX")]
    pub prefix: Option<String>,
    /// Allow plain HTTP endpoints.
    #[arg(long, env = "TALLY_ALLOW_HTTP")]
    pub allow_http: bool,
    #[arg(long, env = "TALLY_ACCESS_KEY_ID")]
    pub access_key_id: Option<String>,
    #[arg(long, env = "TALLY_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,
    #[arg(long, env = "TALLY_AZURE_ACCOUNT")]
    pub azure_account: Option<String>,
    #[arg(long, env = "TALLY_AZURE_ACCESS_KEY", hide_env_values = true)]
    pub azure_access_key: Option<String>,
    /// Path to, or content of, a Google service account key.
    #[arg(long, env = "TALLY_GOOGLE_SERVICE_ACCOUNT_KEY", hide_env_values = true)]
    pub google_service_account_key: Option<String>,
    /// Root directory of the local store.
    #[arg(long, env = "TALLY_LOCAL_ROOT")]
    pub local_root: Option<PathBuf>,
}

impl StoreArgs {
    pub fn into_configuration(self) -> Result<BlobStoreConfiguration> {
        let store = self.store.name();

        let config = match self.store {
            StoreKind::Aws => BlobStoreConfiguration::Aws(AwsConfiguration {
                bucket_name: self.bucket.context(MissingStoreArgumentSnafu {
                    name: "--bucket",
                    store,
                })?,
                prefix: self.prefix,
                access_key_id: self.access_key_id,
                secret_access_key: self.secret_access_key,
                region: self.region,
            }),
            StoreKind::S3Compatible => {
                BlobStoreConfiguration::S3Compatible(S3CompatibleConfiguration {
                    bucket_name: self.bucket.context(MissingStoreArgumentSnafu {
                        name: "--bucket",
                        store,
                    })?,
                    prefix: self.prefix,
                    endpoint: self.endpoint.context(MissingStoreArgumentSnafu {
                        name: "--endpoint",
                        store,
                    })?,
                    access_key_id: self.access_key_id.context(MissingStoreArgumentSnafu {
                        name: "--access-key-id",
                        store,
                    })?,
                    secret_access_key: self.secret_access_key.context(
                        MissingStoreArgumentSnafu {
                            name: "--secret-access-key",
                            store,
                        },
                    )?,
                    region: self.region,
                    allow_http: self.allow_http,
                })
            }
            StoreKind::Azure => BlobStoreConfiguration::Azure(AzureConfiguration {
                container_name: self.bucket.context(MissingStoreArgumentSnafu {
                    name: "--bucket",
                    store,
                })?,
                prefix: self.prefix,
                storage_account_name: self.azure_account.context(MissingStoreArgumentSnafu {
                    name: "--azure-account",
                    store,
                })?,
                storage_account_key: self.azure_access_key.context(
                    MissingStoreArgumentSnafu {
                        name: "--azure-access-key",
                        store,
                    },
                )?,
            }),
            StoreKind::Google => BlobStoreConfiguration::Google(GoogleConfiguration {
                bucket_name: self.bucket.context(MissingStoreArgumentSnafu {
                    name: "--bucket",
                    store,
                })?,
                prefix: self.prefix,
                service_account_key: self.google_service_account_key.context(
                    MissingStoreArgumentSnafu {
                        name: "--google-service-account-key",
                        store,
                    },
                )?,
            }),
            StoreKind::Local => BlobStoreConfiguration::Local(LocalConfiguration {
                root_path: self.local_root.context(MissingStoreArgumentSnafu {
                    name: "--local-root",
                    store,
                })?,
            }),
            StoreKind::Temporary => BlobStoreConfiguration::Temporary,
            StoreKind::Memory => BlobStoreConfiguration::Memory,
        };

        Ok(config)
    }
}
