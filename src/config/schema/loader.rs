use super::AgentConfig;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::Path;

impl AgentConfig {
    /// Load `~/.unit-agent/config.toml`, writing a default one first if the
    /// agent has never been configured.
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let agent_dir = home.join(".unit-agent");
        let config_path = agent_dir.join("config.toml");

        if !agent_dir.exists() {
            fs::create_dir_all(&agent_dir).context("Failed to create .unit-agent directory")?;
        }

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let mut config = Self {
                config_path,
                ..Self::default()
            };
            config.save()?;
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load the config at `path`, apply env overrides and validate.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        let mut config: AgentConfig = toml::from_str(&contents)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        config.config_path = path.to_path_buf();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
