use super::{AgentConfig, LogLevel};
use crate::uniter::charm::CharmUrl;
use std::path::PathBuf;
use std::str::FromStr;

impl AgentConfig {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(unit) = std::env::var("UNIT_AGENT_UNIT")
            && !unit.is_empty()
        {
            self.unit.name = unit;
        }

        if let Ok(url) = std::env::var("UNIT_AGENT_CHARM_URL")
            && !url.is_empty()
        {
            match CharmUrl::parse(&url) {
                Ok(url) => self.unit.charm_url = Some(url),
                Err(error) => tracing::warn!(%error, "ignoring UNIT_AGENT_CHARM_URL"),
            }
        }

        if let Ok(path) = std::env::var("UNIT_AGENT_STATE_PATH")
            && !path.is_empty()
        {
            self.state.path = Some(PathBuf::from(path));
        }

        if let Ok(level) = std::env::var("UNIT_AGENT_LOG_LEVEL")
            && let Ok(level) = LogLevel::from_str(&level)
        {
            self.log.level = level;
        }
    }
}
