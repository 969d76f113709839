use clap::Args;
use serde_json::Value;
use snafu::{ResultExt, ensure};
use tally_ingestor_core::ndjson::decode_ndjson;
use tally_push_client::HttpPushClient;
use tokio_util::sync::CancellationToken;

use crate::error::{InvalidArgumentSnafu, IoSnafu, JsonParseSnafu, PushClientSnafu, Result};

/// Arguments for connecting to a running server.
#[derive(Args, Debug, Clone)]
pub struct RemoteArgs {
    /// The address of the tally HTTP server
    #[arg(long, env = "TALLY_REMOTE_ADDRESS", default_value = "http://127.0.0.1:7780")]
    pub http_address: String,
}

impl RemoteArgs {
    pub fn client(&self) -> HttpPushClient {
        HttpPushClient::new(&self.http_address)
    }
}

/// Push events to a running server
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Events to push: a JSON object, or @file_path for a file with one JSON object per line
    #[arg(required = true)]
    events: Vec<String>,
    #[clap(flatten)]
    remote: RemoteArgs,
}

impl PushArgs {
    pub async fn run(self, _ct: CancellationToken) -> Result<()> {
        let client = self.remote.client();

        let mut events = Vec::new();
        for arg in &self.events {
            events.extend(parse_events(arg)?);
        }

        ensure!(
            !events.is_empty(),
            InvalidArgumentSnafu {
                name: "events",
                message: "no events to push",
            }
        );

        for event in events {
            let response = client.push(&event).await.context(PushClientSnafu {})?;
            match response.flushed {
                Some(flushed) => println!(
                    "Pushed event, batch flushed: {} events to {}",
                    flushed.count,
                    flushed.key.as_deref().unwrap_or("-")
                ),
                None => println!("Pushed event, batch size {}", response.batch_size),
            }
        }

        Ok(())
    }
}

/// Flush the buffer of a running server
#[derive(Args, Debug)]
pub struct FlushArgs {
    #[clap(flatten)]
    remote: RemoteArgs,
}

impl FlushArgs {
    pub async fn run(self, _ct: CancellationToken) -> Result<()> {
        let response = self
            .remote
            .client()
            .flush()
            .await
            .context(PushClientSnafu {})?;

        match response.filename {
            Some(filename) => println!(
                "Flushed {} events to {}/{}",
                response.flushed,
                response.bucket.as_deref().unwrap_or_default(),
                filename
            ),
            None => println!("Nothing to flush"),
        }

        Ok(())
    }
}

/// Show the status of a running server
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[clap(flatten)]
    remote: RemoteArgs,
}

impl StatusArgs {
    pub async fn run(self, _ct: CancellationToken) -> Result<()> {
        let response = self
            .remote
            .client()
            .status()
            .await
            .context(PushClientSnafu {})?;

        let output = serde_json::to_string_pretty(&response).context(JsonParseSnafu {})?;
        println!("{output}");

        Ok(())
    }
}

/// Parse a single `push` argument into events.
fn parse_events(arg: &str) -> Result<Vec<Value>> {
    if let Some(file_path) = arg.strip_prefix('@') {
        let content = std::fs::read(file_path).context(IoSnafu {})?;
        return decode_ndjson(&content).context(JsonParseSnafu {});
    }

    let event = serde_json::from_str(arg).context(JsonParseSnafu {})?;
    Ok(vec![event])
}
