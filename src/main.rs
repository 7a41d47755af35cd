mod auth;
mod cli;
mod config;
mod error;
mod logging;
mod output;
mod providers;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.debug);

    output::print_banner();

    info!("Starting jksctl - Jenkins build metadata collector");
    cli.execute().await?;

    Ok(())
}
