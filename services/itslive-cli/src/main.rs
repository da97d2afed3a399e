//! `itslive`: glacier velocity time series from the ITS_LIVE cubes.
//!
//! Configuration comes from the command line and the environment (a `.env`
//! file is loaded when present):
//!
//! - `ITSLIVE_CATALOG_URL`: catalog to load instead of the published one
//! - `ITSLIVE_CATALOG_CACHE`: location of the cached default catalog
//! - `CUBE_CACHE_CAPACITY`, `CUBE_OPEN_TIMEOUT_SECS`: open-cube cache tuning
//! - `RUST_LOG`: log filter, overridden by `--debug`

mod cli;
mod commands;
mod input;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Commands::Export(args) => {
            let session = commands::open_session(&args.catalog).await?;
            debug!(catalog = session.catalog_source(), "Using catalog");
            commands::run_export(&session, args, &mut stdout).await
        }
        Commands::Find(args) => {
            let session = commands::open_session(&args.catalog).await?;
            commands::run_find(&session, args, &mut stdout)
        }
    }
}

/// Logs go to stderr so that tables on stdout stay clean.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
