//! nai-site entry point.
//!
//! Logging goes to stderr so stdout carries only the JSON result of the
//! command.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use nai_client::{HttpConfig, HttpNetwork, Network};
use nai_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

mod cli;
mod commands;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = AppConfig::load()?;

    let output = match &cli.command {
        Command::Prerender(args) => commands::prerender(args, config.prerender.clone())?,
        Command::Offline(command) => {
            let cache = CacheDb::open(&config.db_path).await?;
            let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(HttpConfig::from(&config))?);
            tracing::debug!("offline policy for {} using {}", config.offline.origin, config.db_path.display());
            commands::offline(command, &config.offline, &cache, network).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
