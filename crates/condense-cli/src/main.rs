//! Condense CLI entrypoint.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod handlers;

use config::ServiceConfig;

#[derive(Parser)]
#[command(name = "condense")]
#[command(author, version, about = "Asynchronous text summarization service", long_about = None)]
struct Cli {
    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server.
    Serve,
    /// Run the background worker pool.
    Worker {
        /// Override the configured number of worker tasks.
        #[arg(long)]
        concurrency: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => handlers::serve(config).await,
        Commands::Worker { concurrency } => {
            let mut config = config;
            if let Some(concurrency) = concurrency {
                config.worker.concurrency = concurrency;
            }
            handlers::worker(config).await
        }
    }
}
