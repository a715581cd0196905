use super::state::OperationState;
use crate::uniter::charm::CharmUrl;
use crate::uniter::hook::HookInfo;
use anyhow::Result;
use std::future::Future;
use std::pin::Pin;

pub type PhaseFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<OperationState>>> + Send + 'a>>;

/// One unit of reconciling work.
///
/// The executor drives `prepare`, `execute` and `commit` in that order, at
/// most once each. Every phase may hand back a replacement state, which the
/// executor persists before starting the next phase.
pub trait Operation: Send {
    /// Short human-readable description, used in logs.
    fn describe(&self) -> String;

    fn prepare<'a>(&'a mut self, state: &'a OperationState) -> PhaseFuture<'a>;

    fn execute<'a>(&'a mut self, state: &'a OperationState) -> PhaseFuture<'a>;

    fn commit<'a>(&'a mut self, state: &'a OperationState) -> PhaseFuture<'a>;

    /// Called once the executor has durably recorded the outcome of
    /// `commit`. Not called if commit or persisting its state failed.
    fn committed(&mut self) {}
}

/// Builds operations. Every constructor is fallible; callers decide whether a
/// construction failure is fatal.
pub trait Factory: Send + Sync {
    fn new_install(&self, charm_url: &CharmUrl) -> Result<Box<dyn Operation>>;

    fn new_upgrade(&self, charm_url: &CharmUrl) -> Result<Box<dyn Operation>>;

    fn new_revert_upgrade(&self, charm_url: &CharmUrl) -> Result<Box<dyn Operation>>;

    fn new_resolved_upgrade(&self, charm_url: &CharmUrl) -> Result<Box<dyn Operation>>;

    fn new_run_hook(&self, info: &HookInfo) -> Result<Box<dyn Operation>>;

    fn new_skip_hook(&self, info: &HookInfo) -> Result<Box<dyn Operation>>;

    fn new_action(&self, action_id: &str) -> Result<Box<dyn Operation>>;

    fn new_accept_leadership(&self) -> Result<Box<dyn Operation>>;

    fn new_resign_leadership(&self) -> Result<Box<dyn Operation>>;
}

/// Runs operations to completion and owns the persisted operation state.
pub trait Executor: Send {
    /// Run the full lifecycle of `op`. Any phase failure is returned as is.
    fn run(&mut self, op: Box<dyn Operation>) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Most recently persisted operation state.
    fn state(&self) -> OperationState;
}
