mod env_overrides;
mod loader;
mod types;

pub use types::{AgentConfig, LogConfig, LogLevel, StateConfig, UnitConfig};
