use crate::error::ConfigError;
use crate::uniter::charm::CharmUrl;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub unit: UnitConfig,

    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConfig {
    /// Unit name, `<service>/<number>` (default: unit/0)
    #[serde(default = "default_unit_name")]
    pub name: String,
    /// Charm the unit was last known to run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charm_url: Option<CharmUrl>,
    /// Whether an upgrade left the charm directory conflicted
    #[serde(default)]
    pub conflicted: bool,
}

fn default_unit_name() -> String {
    "unit/0".into()
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            name: default_unit_name(),
            charm_url: None,
            conflicted: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    /// Operation state file (default: `<config dir>/state/operation.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

impl AgentConfig {
    /// Operation state file, defaulting to a `state/` dir next to config.toml.
    pub fn state_path(&self) -> PathBuf {
        self.state.path.clone().unwrap_or_else(|| {
            self.config_path
                .parent()
                .map_or_else(|| PathBuf::from("."), PathBuf::from)
                .join("state")
                .join("operation.json")
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_unit_name(&self.unit.name)
    }
}

fn validate_unit_name(name: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::Validation(format!("invalid unit name {name:?}"));
    let (service, number) = name.split_once('/').ok_or_else(invalid)?;

    let service_ok = service.starts_with(|c: char| c.is_ascii_lowercase())
        && service
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !service_ok || number.parse::<u32>().is_err() {
        return Err(invalid());
    }
    Ok(())
}
