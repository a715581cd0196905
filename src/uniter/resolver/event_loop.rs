use super::gate::update_charm_dir;
use super::opfactory::ResolverOpFactory;
use super::{LocalState, NextOp, Resolver};
use crate::error::LoopError;
use crate::uniter::charm::CharmUrl;
use crate::uniter::charmdir::Locker;
use crate::uniter::operation::{Executor, Factory};
use crate::uniter::remotestate::Watcher;
use std::sync::Arc;
use tokio::sync::watch;

pub type IdleCallback = Box<dyn FnMut() -> anyhow::Result<()> + Send>;

/// Collaborators and initial local state for [`run_loop`].
pub struct LoopConfig {
    pub resolver: Box<dyn Resolver>,
    pub watcher: Box<dyn Watcher>,
    pub executor: Box<dyn Executor>,
    pub factory: Box<dyn Factory>,
    pub charm_url: Option<CharmUrl>,
    pub conflicted: bool,
    /// Flipping this to `true` stops the loop at its next idle wait.
    pub dying: watch::Receiver<bool>,
    /// Called whenever the resolver reports nothing left to do.
    pub on_idle: Option<IdleCallback>,
    pub charm_dir_locker: Arc<dyn Locker>,
}

#[derive(Debug)]
pub enum LoopOutcome {
    /// `dying` fired while the loop was waiting for remote changes.
    Cancelled,
    Failed(LoopError),
}

/// Why the loop stopped, plus the local state it had reached.
#[derive(Debug)]
pub struct LoopExit {
    pub local_state: LocalState,
    pub outcome: LoopOutcome,
}

impl LoopExit {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.outcome, LoopOutcome::Cancelled)
    }

    pub fn error(&self) -> Option<&LoopError> {
        match &self.outcome {
            LoopOutcome::Cancelled => None,
            LoopOutcome::Failed(err) => Some(err),
        }
    }
}

enum Settled {
    Waiting,
    Idle,
}

/// Repeatedly feed local and remote state to the resolver and run whatever
/// operations it asks for.
///
/// Operations are drained back to back, re-reading both states before every
/// resolver call. Once the resolver stops asking for work the charm directory
/// availability is republished and the loop waits for a remote change or for
/// `dying`. `on_idle` runs only when the resolver reports
/// [`NextOp::NoOperation`], never on [`NextOp::Waiting`].
///
/// Any resolver, executor or idle callback error stops the loop immediately.
/// Whatever the outcome, the last local state is returned with it, e.g. to
/// learn which charm an interrupted upgrade was heading for.
pub async fn run_loop(config: LoopConfig) -> LoopExit {
    let LoopConfig {
        resolver,
        mut watcher,
        mut executor,
        factory,
        charm_url,
        conflicted,
        mut dying,
        mut on_idle,
        charm_dir_locker,
    } = config;

    let factory = ResolverOpFactory::new(
        factory,
        LocalState {
            charm_url,
            conflicted,
            ..LocalState::default()
        },
    );
    let exit = |outcome: LoopOutcome| LoopExit {
        local_state: factory.local_state(),
        outcome,
    };

    // Recovering from a restart: publish availability before any operation.
    update_charm_dir(&executor.state(), charm_dir_locker.as_ref());

    loop {
        let settled = loop {
            factory.refresh(watcher.snapshot(), executor.state());
            let local = factory.local_state();
            let remote = factory.remote_state();

            match resolver.next_op(&local, &remote, &factory) {
                Ok(NextOp::Run(op)) => {
                    tracing::trace!(operation = %op.describe(), "running op");
                    if let Err(err) = executor.run(op).await {
                        tracing::warn!(error = %err, "operation failed; stopping resolver loop");
                        return exit(LoopOutcome::Failed(LoopError::Execution(err)));
                    }
                }
                Ok(NextOp::Waiting) => break Ok(Settled::Waiting),
                Ok(NextOp::NoOperation) => break Ok(Settled::Idle),
                Err(err) => break Err(err),
            }
        };

        update_charm_dir(&factory.local_state().operation, charm_dir_locker.as_ref());

        match settled {
            // Still expecting events, so the agent is not idle.
            Ok(Settled::Waiting) => tracing::trace!("resolver waiting for remote state"),
            Ok(Settled::Idle) => {
                tracing::info!("resolver idle");
                if let Some(on_idle) = on_idle.as_mut()
                    && let Err(err) = on_idle()
                {
                    tracing::warn!(error = %err, "idle callback failed; stopping resolver loop");
                    return exit(LoopOutcome::Failed(LoopError::Idle(err)));
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "resolver failed; stopping resolver loop");
                return exit(LoopOutcome::Failed(LoopError::Resolver(err)));
            }
        }

        tokio::select! {
            biased;
            () = wait_dying(&mut dying) => {
                tracing::info!("resolver loop cancelled");
                return exit(LoopOutcome::Cancelled);
            }
            changed = watcher.remote_state_changed() => {
                if !changed {
                    tracing::warn!("remote state watcher stopped; stopping resolver loop");
                    return exit(LoopOutcome::Failed(LoopError::WatcherClosed));
                }
            }
        }
    }
}

/// Resolves once `dying` reads `true`. Never resolves if the sender is gone,
/// since cancellation can no longer arrive.
async fn wait_dying(dying: &mut watch::Receiver<bool>) {
    let closed = dying.wait_for(|dying| *dying).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
