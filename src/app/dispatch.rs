use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result};
use unit_agent::AgentConfig;

use crate::app::status::render_status;

pub async fn dispatch(cli: Cli, config: AgentConfig) -> Result<()> {
    match cli.command {
        Commands::Status => {
            println!("{}", render_status(&config).await?);
            Ok(())
        }
        Commands::Config => {
            let rendered =
                toml::to_string_pretty(&config).context("Failed to serialize config")?;
            println!("# {}", config.config_path.display());
            print!("{rendered}");
            Ok(())
        }
    }
}
