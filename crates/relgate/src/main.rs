//! Relgate CLI binary.

use anyhow::Result;
use relgate::cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Main entry point for the relgate CLI.
///
/// Uses tokio's current_thread runtime: resolutions are sequential
/// I/O-bound walks over external tools, so a multi-threaded scheduler buys
/// nothing here.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Initialize tracing subscriber
    // Can be controlled via RUST_LOG environment variable
    // Example: RUST_LOG=relgate=debug cargo run
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relgate=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse_args();
    cli.execute().await
}
