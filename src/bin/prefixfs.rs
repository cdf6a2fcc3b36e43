//! prefixfs CLI Binary
//!
//! Command-line interface for browsing a flat object store as folders.

use anyhow::Context;
use clap::Parser;
use prefixfs::logging::init_logging;
use prefixfs::tooling::cli::{Cli, CliContext};
use std::process;

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.load_config().context("loading configuration")?;
    init_logging(Some(&config.logging)).context("initializing logging")?;

    let mut context = CliContext::new(&config, cli.yes)
        .await
        .context("opening store")?;
    let output = context.execute(&cli.command).await?;
    println!("{}", output);
    context.finish().context("command left work unfinished")?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
