use crate::uniter::charmdir::Locker;
use crate::uniter::hook::HookKind;
use crate::uniter::operation::{OperationKind, OperationState};

fn charm_changing(state: &OperationState) -> bool {
    match state.kind {
        OperationKind::Install | OperationKind::Upgrade => true,
        OperationKind::RunHook => state
            .hook
            .as_ref()
            .is_some_and(|hook| hook.kind == HookKind::UpgradeCharm),
        OperationKind::RunAction | OperationKind::Continue => false,
    }
}

/// Whether the charm directory is stable enough for other workers to read,
/// judged from persisted operation state alone.
pub fn charm_dir_available(state: &OperationState) -> bool {
    state.started && !state.stopped && !charm_changing(state)
}

/// Publish charm directory availability for concurrent workers.
pub fn update_charm_dir(state: &OperationState, locker: &dyn Locker) {
    let available = charm_dir_available(state);
    tracing::debug!(
        available,
        started = state.started,
        stopped = state.stopped,
        changing = charm_changing(state),
        "charmdir availability"
    );
    locker.set_available(available);
}
