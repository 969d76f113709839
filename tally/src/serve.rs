use std::{net::SocketAddr, num::NonZeroUsize, time::Duration};

use clap::Args;
use snafu::ResultExt;
use tally_ingestor_core::{DEFAULT_MAX_BATCH_SIZE, EventIngestor, ShutdownCoordinator};
use tally_ingestor_http::HttpIngestor;
use tally_object_store::create_blob_store;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    error::{BlobStoreSnafu, InvalidServerAddressSnafu, IoSnafu, ObservabilitySnafu, Result},
    store::StoreArgs,
};

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// The address of the HTTP ingestor server.
    #[arg(long, env = "TALLY_HTTP_ADDRESS", default_value = "127.0.0.1:7780")]
    http_address: String,
    /// Number of buffered events that triggers a flush.
    #[arg(long, env = "TALLY_MAX_BATCH_SIZE", default_value_t = DEFAULT_MAX_BATCH_SIZE)]
    max_batch_size: NonZeroUsize,
    /// Timeout of a single batch upload, in seconds.
    #[arg(long, env = "TALLY_UPLOAD_TIMEOUT_SECS", default_value_t = 30)]
    upload_timeout_secs: u64,
    #[clap(flatten)]
    store: StoreArgs,
}

impl ServeArgs {
    pub async fn run(self, ct: CancellationToken) -> Result<()> {
        let observability = tally_observability::init_observability(
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
        )
        .context(ObservabilitySnafu {})?;

        let http_address = self
            .http_address
            .parse::<SocketAddr>()
            .context(InvalidServerAddressSnafu {})?;

        if !self.store.store.is_durable() {
            warn!(
                store = ?self.store.store,
                "batches are discarded when the process exits"
            );
        }

        let config = self.store.into_configuration()?;
        let blob_store = create_blob_store(&config, Duration::from_secs(self.upload_timeout_secs))
            .context(BlobStoreSnafu {})?;

        let ingestor = EventIngestor::new(blob_store, self.max_batch_size);
        let flusher = ingestor.flusher().clone();
        let shutdown = ShutdownCoordinator::new(ct);

        info!(
            address = %http_address,
            destination = %flusher.destination(),
            max_batch_size = self.max_batch_size.get(),
            "starting event ingestor"
        );

        let app = HttpIngestor::new(ingestor, shutdown.clone()).into_router();
        let listener = tokio::net::TcpListener::bind(http_address)
            .await
            .context(IoSnafu {})?;

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.clone().draining())
            .await
            .context(IoSnafu {});

        if let Err(err) = &served {
            error!(err = ?err, "HTTP server exited with error");
        }

        // Buffered events are flushed even if the server failed.
        match shutdown.finish(&flusher).await {
            Ok(result) if result.is_empty() => info!("shutdown complete, nothing to flush"),
            Ok(result) => info!(
                count = result.count,
                key = result.key.as_deref().unwrap_or_default(),
                "shutdown complete, final batch flushed"
            ),
            Err(err) => error!(err = ?err, "final flush failed, buffered events are lost"),
        }

        observability.shutdown();

        served
    }
}
