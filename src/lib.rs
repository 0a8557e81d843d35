pub mod analysis;
pub mod cli;
pub mod config;
pub mod errors;
pub mod overlay;
pub mod screen;

use clap::Parser;

use crate::errors::ObscuraResult;

/// Entry point for the `obscura` binary.
pub async fn run() -> ObscuraResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let args = cli::Args::parse();
    tracing::debug!(?args, "arguments parsed");
    cli::execute(args).await
}
