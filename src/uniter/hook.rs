use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum HookKind {
    Install,
    Start,
    ConfigChanged,
    UpgradeCharm,
    Stop,
    LeaderElected,
    LeaderDeposed,
    LeaderSettingsChanged,
    UpdateStatus,
    CollectMetrics,
    RelationJoined,
    RelationChanged,
    RelationDeparted,
    RelationBroken,
}

impl HookKind {
    pub fn is_relation(self) -> bool {
        matches!(
            self,
            Self::RelationJoined
                | Self::RelationChanged
                | Self::RelationDeparted
                | Self::RelationBroken
        )
    }
}

/// A hook to run (or skip), as recorded in operation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookInfo {
    pub kind: HookKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    #[error("{0} hook requires a relation id")]
    MissingRelation(HookKind),

    #[error("{kind} hook must not name a relation or remote unit")]
    UnexpectedRelation { kind: HookKind },
}

impl HookInfo {
    pub fn new(kind: HookKind) -> Self {
        Self {
            kind,
            relation_id: None,
            remote_unit: None,
        }
    }

    pub fn relation(kind: HookKind, relation_id: i64, remote_unit: Option<String>) -> Self {
        Self {
            kind,
            relation_id: Some(relation_id),
            remote_unit,
        }
    }

    pub fn validate(&self) -> Result<(), HookError> {
        if self.kind.is_relation() {
            if self.relation_id.is_none() {
                return Err(HookError::MissingRelation(self.kind));
            }
        } else if self.relation_id.is_some() || self.remote_unit.is_some() {
            return Err(HookError::UnexpectedRelation { kind: self.kind });
        }
        Ok(())
    }
}
