//! imgpush - Main Application Entry Point
//!
//! Pushes a built VM image to a cloud provider: the file is uploaded to the
//! provider's object storage and registered as a bootable machine image.
//!
//! # Startup Flow
//!
//! 1. Load a `.env` file if present
//! 2. Parse the command line (flags fall back to environment variables)
//! 3. Initialize logging
//! 4. Load endpoint overrides from the environment
//! 5. Run the selected push; the first error ends the process

use clap::Parser;
use tracing_subscriber::EnvFilter;

use imgpush::cli::{Cli, Command};
use imgpush::config::Endpoints;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before parsing so that .env values act as flag fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let endpoints = Endpoints::from_env()?;

    match cli.command {
        Command::Push(push) => imgpush::push::run(push.provider, endpoints).await?,
    }

    Ok(())
}
