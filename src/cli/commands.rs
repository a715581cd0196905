use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `unit-agent` - reconciles a unit's applied state with its desired state.
#[derive(Parser, Debug)]
#[command(name = "unit-agent")]
#[command(version = "0.1.0")]
#[command(about = "Unit agent operational tooling.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.unit-agent/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the persisted operation state and charm directory availability
    Status,

    /// Print the effective configuration (file plus env overrides)
    Config,
}
