//! ferry - project-pinned release binary installer.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ferry::cmd;
use ferry::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr and are opt-in via RUST_LOG; stdout stays
    // clean for command output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Install => cmd::install::run().await,
        Commands::Run { args } => cmd::run::run(&args),
        Commands::Uninstall => cmd::uninstall::run(),
        Commands::Checksum { files } => cmd::checksum::run(&files),
    }
}
