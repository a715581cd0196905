mod watcher;

pub use watcher::{ChannelWatcher, Watcher, channel};

use crate::uniter::charm::CharmUrl;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Life {
    #[default]
    Alive,
    Dying,
    Dead,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ResolvedMode {
    #[default]
    None,
    RetryHooks,
    NoHooks,
}

/// Point-in-time view of the state the unit should converge to.
///
/// Snapshots are replaced wholesale on every change; nothing in the agent
/// mutates one after it has been taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub life: Life,
    #[serde(default)]
    pub charm_url: Option<CharmUrl>,
    #[serde(default)]
    pub force_charm_upgrade: bool,
    #[serde(default)]
    pub resolved_mode: ResolvedMode,
    #[serde(default)]
    pub config_version: u64,
    #[serde(default)]
    pub leader: bool,
    #[serde(default)]
    pub leader_settings_version: u64,
    #[serde(default)]
    pub update_status_version: u64,
    /// Action ids still waiting to run.
    #[serde(default)]
    pub actions: Vec<String>,
}
