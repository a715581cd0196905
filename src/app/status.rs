use anyhow::Result;
use serde::Serialize;
use unit_agent::AgentConfig;
use unit_agent::error::StateError;
use unit_agent::uniter::operation::{OperationState, StateFile};
use unit_agent::uniter::resolver::charm_dir_available;

#[derive(Debug, Serialize)]
pub struct UnitStatus {
    pub unit: String,
    pub state_file: String,
    /// `None` until the unit has persisted its first operation.
    pub operation: Option<OperationState>,
    pub charm_dir_available: bool,
}

pub async fn collect_status(config: &AgentConfig) -> Result<UnitStatus> {
    let file = StateFile::new(config.state_path());
    let operation = match file.read().await {
        Ok(state) => Some(state),
        Err(StateError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(UnitStatus {
        unit: config.unit.name.clone(),
        state_file: file.path().display().to_string(),
        charm_dir_available: operation.as_ref().is_some_and(charm_dir_available),
        operation,
    })
}

pub async fn render_status(config: &AgentConfig) -> Result<String> {
    let status = collect_status(config).await?;
    Ok(serde_json::to_string_pretty(&status)?)
}
