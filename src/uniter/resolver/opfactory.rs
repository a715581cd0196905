use super::LocalState;
use super::on_commit::OnCommit;
use crate::uniter::charm::CharmUrl;
use crate::uniter::hook::{HookInfo, HookKind};
use crate::uniter::operation::{Factory, Operation, OperationState};
use crate::uniter::remotestate::Snapshot;
use anyhow::Result;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Views {
    local: LocalState,
    remote: Snapshot,
}

fn lock(views: &Mutex<Views>) -> MutexGuard<'_, Views> {
    views.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Wraps a [`Factory`] so that operations which change local state record
/// that change when, and only when, they commit.
///
/// Values such as config versions are read from the remote snapshot when the
/// operation is created and captured by the commit callback. Remote changes
/// seen between creation and commit therefore never leak into the recorded
/// local state, and later remote changes still trigger new operations.
pub struct ResolverOpFactory {
    inner: Box<dyn Factory>,
    views: Arc<Mutex<Views>>,
}

impl ResolverOpFactory {
    pub fn new(inner: Box<dyn Factory>, local: LocalState) -> Self {
        Self {
            inner,
            views: Arc::new(Mutex::new(Views {
                local,
                remote: Snapshot::default(),
            })),
        }
    }

    pub fn local_state(&self) -> LocalState {
        lock(&self.views).local.clone()
    }

    pub fn remote_state(&self) -> Snapshot {
        lock(&self.views).remote.clone()
    }

    /// Install a fresh remote snapshot and the executor's latest operation
    /// state. Completed actions that are no longer pending are dropped.
    pub fn refresh(&self, remote: Snapshot, operation: OperationState) {
        let mut views = lock(&self.views);
        trim_completed_actions(&remote.actions, &mut views.local.completed_actions);
        views.remote = remote;
        views.local.operation = operation;
    }

    fn wrap_upgrade_op(&self, op: Box<dyn Operation>, charm_url: &CharmUrl) -> Box<dyn Operation> {
        let views = Arc::clone(&self.views);
        let charm_url = charm_url.clone();
        Box::new(OnCommit::new(op).wrap(move || {
            let mut views = lock(&views);
            views.local.charm_url = Some(charm_url.clone());
            views.local.restart = true;
            views.local.conflicted = false;
        }))
    }

    fn wrap_hook_op(&self, op: Box<dyn Operation>, info: &HookInfo) -> Box<dyn Operation> {
        let remote = self.remote_state();
        let mut op = OnCommit::new(op);

        match info.kind {
            HookKind::ConfigChanged => {
                let views = Arc::clone(&self.views);
                let version = remote.config_version;
                op = op.wrap(move || lock(&views).local.config_version = version);
            }
            HookKind::LeaderSettingsChanged => {
                let views = Arc::clone(&self.views);
                let version = remote.leader_settings_version;
                op = op.wrap(move || lock(&views).local.leader_settings_version = version);
            }
            _ => {}
        }

        // Whatever ran, update-status only fires again after the next timer tick.
        let views = Arc::clone(&self.views);
        let version = remote.update_status_version;
        Box::new(op.wrap(move || lock(&views).local.update_status_version = version))
    }
}

fn trim_completed_actions(pending: &[String], completed: &mut BTreeSet<String>) {
    completed.retain(|id| pending.contains(id));
}

impl Factory for ResolverOpFactory {
    fn new_install(&self, charm_url: &CharmUrl) -> Result<Box<dyn Operation>> {
        self.inner.new_install(charm_url)
    }

    fn new_upgrade(&self, charm_url: &CharmUrl) -> Result<Box<dyn Operation>> {
        let op = self.inner.new_upgrade(charm_url)?;
        Ok(self.wrap_upgrade_op(op, charm_url))
    }

    fn new_revert_upgrade(&self, charm_url: &CharmUrl) -> Result<Box<dyn Operation>> {
        let op = self.inner.new_revert_upgrade(charm_url)?;
        Ok(self.wrap_upgrade_op(op, charm_url))
    }

    fn new_resolved_upgrade(&self, charm_url: &CharmUrl) -> Result<Box<dyn Operation>> {
        let op = self.inner.new_resolved_upgrade(charm_url)?;
        Ok(self.wrap_upgrade_op(op, charm_url))
    }

    fn new_run_hook(&self, info: &HookInfo) -> Result<Box<dyn Operation>> {
        let op = self.inner.new_run_hook(info)?;
        Ok(self.wrap_hook_op(op, info))
    }

    fn new_skip_hook(&self, info: &HookInfo) -> Result<Box<dyn Operation>> {
        let op = self.inner.new_skip_hook(info)?;
        Ok(self.wrap_hook_op(op, info))
    }

    fn new_action(&self, action_id: &str) -> Result<Box<dyn Operation>> {
        let op = self.inner.new_action(action_id)?;
        let views = Arc::clone(&self.views);
        let action_id = action_id.to_string();
        Ok(Box::new(OnCommit::new(op).wrap(move || {
            let mut guard = lock(&views);
            let Views { local, remote } = &mut *guard;
            local.completed_actions.insert(action_id.clone());
            trim_completed_actions(&remote.actions, &mut local.completed_actions);
        })))
    }

    fn new_accept_leadership(&self) -> Result<Box<dyn Operation>> {
        self.inner.new_accept_leadership()
    }

    fn new_resign_leadership(&self) -> Result<Box<dyn Operation>> {
        self.inner.new_resign_leadership()
    }
}
