use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    client::{FlushArgs, PushArgs, StatusArgs},
    error::Result,
    serve::ServeArgs,
};

mod client;
mod error;
mod serve;
mod store;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Tally event ingestor")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingestion server
    Serve {
        #[clap(flatten)]
        inner: ServeArgs,
    },
    /// Push events to a running server
    Push {
        #[clap(flatten)]
        inner: PushArgs,
    },
    /// Flush the buffer of a running server
    Flush {
        #[clap(flatten)]
        inner: FlushArgs,
    },
    /// Show the buffer status of a running server
    Status {
        #[clap(flatten)]
        inner: StatusArgs,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{}", snafu::Report::from_error(err));
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ct = CancellationToken::new();

    tokio::spawn({
        let ct = ct.clone();
        async move {
            shutdown_signal().await;
            info!("received termination signal");
            ct.cancel();
        }
    });

    match cli.command {
        Commands::Serve { inner } => inner.run(ct).await,
        Commands::Push { inner } => inner.run(ct).await,
        Commands::Flush { inner } => inner.run(ct).await,
        Commands::Status { inner } => inner.run(ct).await,
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
