use crate::uniter::charm::CharmUrl;
use crate::uniter::hook::{HookError, HookInfo};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OperationKind {
    Install,
    Upgrade,
    RunHook,
    RunAction,
    #[default]
    Continue,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Step {
    Queued,
    #[default]
    Pending,
    Done,
}

/// Persisted record of the operation the executor last worked on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationState {
    pub kind: OperationKind,
    pub step: Step,
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub stopped: bool,
    #[serde(default)]
    pub leader: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<HookInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charm_url: Option<CharmUrl>,
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("{kind} operation requires {field}")]
    MissingField {
        kind: OperationKind,
        field: &'static str,
    },

    #[error("{kind} operation must not carry {field}")]
    UnexpectedField {
        kind: OperationKind,
        field: &'static str,
    },

    #[error("invalid hook: {0}")]
    Hook(#[from] HookError),

    #[error("operation state file {0} not found")]
    NotFound(String),

    #[error("operation state file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("operation state file {path} is malformed: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl OperationState {
    /// Fresh install of `charm_url`, the state a brand new unit starts from.
    pub fn install(charm_url: CharmUrl) -> Self {
        Self {
            kind: OperationKind::Install,
            step: Step::Queued,
            charm_url: Some(charm_url),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), StateError> {
        let kind = self.kind;
        let missing = |field| StateError::MissingField { kind, field };
        let unexpected = |field| StateError::UnexpectedField { kind, field };

        match kind {
            OperationKind::Install | OperationKind::Upgrade => {
                if self.charm_url.is_none() {
                    return Err(missing("charm_url"));
                }
                if self.hook.is_some() {
                    return Err(unexpected("hook"));
                }
                if self.action_id.is_some() {
                    return Err(unexpected("action_id"));
                }
            }
            OperationKind::RunHook => {
                let Some(hook) = &self.hook else {
                    return Err(missing("hook"));
                };
                hook.validate()?;
                if self.action_id.is_some() {
                    return Err(unexpected("action_id"));
                }
            }
            OperationKind::RunAction => {
                if self.action_id.as_deref().is_none_or(str::is_empty) {
                    return Err(missing("action_id"));
                }
            }
            OperationKind::Continue => {
                if self.hook.is_some() {
                    return Err(unexpected("hook"));
                }
                if self.action_id.is_some() {
                    return Err(unexpected("action_id"));
                }
            }
        }
        Ok(())
    }
}
