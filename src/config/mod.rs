pub mod schema;

pub use schema::{AgentConfig, LogConfig, LogLevel, StateConfig, UnitConfig};
