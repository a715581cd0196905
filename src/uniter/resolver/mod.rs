//! Resolver loop: drives a unit from its persisted operation state toward the
//! observed remote state, one operation at a time.

mod event_loop;
mod gate;
mod on_commit;
mod opfactory;


pub use event_loop::{IdleCallback, LoopConfig, LoopExit, LoopOutcome, run_loop};
pub use gate::{charm_dir_available, update_charm_dir};
pub use on_commit::OnCommit;
pub use opfactory::ResolverOpFactory;

use crate::uniter::charm::CharmUrl;
use crate::uniter::operation::{Factory, Operation, OperationState};
use crate::uniter::remotestate::Snapshot;
use anyhow::Result;
use std::collections::BTreeSet;
use std::fmt;

/// What the agent has actually applied so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalState {
    /// Operation state as last persisted by the executor.
    pub operation: OperationState,
    pub charm_url: Option<CharmUrl>,
    pub conflicted: bool,
    pub restart: bool,
    pub config_version: u64,
    pub leader_settings_version: u64,
    pub update_status_version: u64,
    pub completed_actions: BTreeSet<String>,
}

/// Resolver verdict for a single pass.
pub enum NextOp {
    /// Run this operation now.
    Run(Box<dyn Operation>),
    /// More remote state changes are needed before progress is possible.
    /// The agent is busy, not idle.
    Waiting,
    /// Nothing left to do until the remote state changes.
    NoOperation,
}

impl fmt::Debug for NextOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run(op) => f.debug_tuple("Run").field(&op.describe()).finish(),
            Self::Waiting => f.write_str("Waiting"),
            Self::NoOperation => f.write_str("NoOperation"),
        }
    }
}

/// Decides the next operation from local and remote state.
///
/// Any `Err` is fatal to the loop. Operations must be built through
/// `factory` so that their local state effects are recorded on commit.
pub trait Resolver: Send + Sync {
    fn next_op(
        &self,
        local: &LocalState,
        remote: &Snapshot,
        factory: &dyn Factory,
    ) -> Result<NextOp>;
}

impl<F> Resolver for F
where
    F: Fn(&LocalState, &Snapshot, &dyn Factory) -> Result<NextOp> + Send + Sync,
{
    fn next_op(
        &self,
        local: &LocalState,
        remote: &Snapshot,
        factory: &dyn Factory,
    ) -> Result<NextOp> {
        self(local, remote, factory)
    }
}
