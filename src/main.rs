#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::Dispatch;
use tracing_subscriber::FmtSubscriber;
use unit_agent::AgentConfig;

mod app;
mod cli;

use cli::commands::Cli;

/// Load config while `bootstrap` collects its warnings; the configured
/// subscriber cannot exist until the log level is known.
fn load_config(path: Option<&Path>, bootstrap: impl Into<Dispatch>) -> Result<AgentConfig> {
    tracing::dispatcher::with_default(&bootstrap.into(), || match path {
        Some(path) => AgentConfig::load_from(path),
        None => AgentConfig::load_or_init(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let bootstrap = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .finish();
    let config = load_config(cli.config.as_deref(), bootstrap)?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::from(config.log.level))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    app::dispatch::dispatch(cli, config).await
}
