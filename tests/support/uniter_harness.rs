#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use unit_agent::uniter::charm::CharmUrl;
use unit_agent::uniter::charmdir::Locker;
use unit_agent::uniter::hook::{HookInfo, HookKind};
use unit_agent::uniter::operation::{
    Factory, LocalExecutor, Operation, OperationKind, OperationState, PhaseFuture, Step,
};
use unit_agent::uniter::remotestate::{self, Snapshot};
use unit_agent::uniter::resolver::{
    IdleCallback, LocalState, LoopConfig, LoopExit, NextOp, Resolver, run_loop,
};

const WAIT: Duration = Duration::from_secs(5);

pub fn charm(url: &str) -> CharmUrl {
    CharmUrl::parse(url).expect("valid charm url")
}

/// Operation state of a unit that has started and is not doing anything.
pub fn settled_state() -> OperationState {
    OperationState {
        kind: OperationKind::Continue,
        step: Step::Pending,
        started: true,
        ..OperationState::default()
    }
}

// ── Journal ──────────────────────────────────────────────────────────

/// Ordered record of operation phases, e.g. `"commit run start hook"`.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn commits(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| e.strip_prefix("commit ").map(str::to_string))
            .collect()
    }
}

// ── Plan: scripted behaviour keyed by operation description ─────────

/// Handles an operation can use to disturb the loop while it executes.
pub struct Controls {
    pub remote: watch::Sender<Snapshot>,
    pub dying: watch::Sender<bool>,
}

type Effect = Box<dyn FnOnce(&Controls) + Send>;

#[derive(Default)]
struct PlanInner {
    refuse: HashSet<String>,
    fail_execute: HashSet<String>,
    on_execute: HashMap<String, Effect>,
}

#[derive(Clone, Default)]
pub struct Plan(Arc<Mutex<PlanInner>>);

impl Plan {
    /// Constructing `description` fails.
    pub fn refuse(&self, description: &str) {
        self.0.lock().unwrap().refuse.insert(description.into());
    }

    /// Executing `description` fails with `"<description> exploded"`.
    pub fn fail_execute(&self, description: &str) {
        self.0.lock().unwrap().fail_execute.insert(description.into());
    }

    /// Run `effect` the first time `description` executes.
    pub fn on_execute(&self, description: &str, effect: impl FnOnce(&Controls) + Send + 'static) {
        self.0
            .lock()
            .unwrap()
            .on_execute
            .insert(description.into(), Box::new(effect));
    }
}

// ── Operations and factory ───────────────────────────────────────────

type Committed = Box<dyn Fn(&OperationState) -> OperationState + Send>;

struct ScriptedOp {
    description: String,
    plan: Plan,
    journal: Journal,
    controls: Weak<Controls>,
    committed: Committed,
}

impl Operation for ScriptedOp {
    fn describe(&self) -> String {
        self.description.clone()
    }

    fn prepare<'a>(&'a mut self, _state: &'a OperationState) -> PhaseFuture<'a> {
        Box::pin(async move {
            self.journal.push(format!("prepare {}", self.description));
            Ok(None)
        })
    }

    fn execute<'a>(&'a mut self, _state: &'a OperationState) -> PhaseFuture<'a> {
        Box::pin(async move {
            self.journal.push(format!("execute {}", self.description));
            let (fail, effect) = {
                let mut plan = self.plan.0.lock().unwrap();
                (
                    plan.fail_execute.contains(&self.description),
                    plan.on_execute.remove(&self.description),
                )
            };
            if let Some(effect) = effect
                && let Some(controls) = self.controls.upgrade()
            {
                effect(&controls);
            }
            if fail {
                return Err(HarnessFailure(format!("{} exploded", self.description)).into());
            }
            Ok(None)
        })
    }

    fn commit<'a>(&'a mut self, state: &'a OperationState) -> PhaseFuture<'a> {
        Box::pin(async move {
            self.journal.push(format!("commit {}", self.description));
            Ok(Some((self.committed)(state)))
        })
    }
}

/// Error raised by scripted failures, so tests can downcast to it.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HarnessFailure(pub String);

pub struct HarnessFactory {
    plan: Plan,
    journal: Journal,
    controls: Weak<Controls>,
}

impl HarnessFactory {
    fn build(
        &self,
        description: String,
        committed: impl Fn(&OperationState) -> OperationState + Send + 'static,
    ) -> Result<Box<dyn Operation>> {
        if self.plan.0.lock().unwrap().refuse.contains(&description) {
            anyhow::bail!("cannot build {description}");
        }
        Ok(Box::new(ScriptedOp {
            description,
            plan: self.plan.clone(),
            journal: self.journal.clone(),
            controls: Weak::clone(&self.controls),
            committed: Box::new(committed),
        }))
    }

    fn queue_upgrade_hook(prev: &OperationState) -> OperationState {
        OperationState {
            kind: OperationKind::RunHook,
            step: Step::Queued,
            started: prev.started,
            leader: prev.leader,
            hook: Some(HookInfo::new(HookKind::UpgradeCharm)),
            ..OperationState::default()
        }
    }

    fn after_hook(kind: HookKind) -> impl Fn(&OperationState) -> OperationState {
        move |prev| OperationState {
            kind: OperationKind::Continue,
            step: Step::Pending,
            started: prev.started || kind == HookKind::Start,
            stopped: prev.stopped || kind == HookKind::Stop,
            leader: prev.leader,
            ..OperationState::default()
        }
    }
}

impl Factory for HarnessFactory {
    fn new_install(&self, charm_url: &CharmUrl) -> Result<Box<dyn Operation>> {
        self.build(format!("install {charm_url}"), |_| OperationState {
            kind: OperationKind::RunHook,
            step: Step::Queued,
            hook: Some(HookInfo::new(HookKind::Install)),
            ..OperationState::default()
        })
    }

    fn new_upgrade(&self, charm_url: &CharmUrl) -> Result<Box<dyn Operation>> {
        self.build(format!("upgrade to {charm_url}"), Self::queue_upgrade_hook)
    }

    fn new_revert_upgrade(&self, charm_url: &CharmUrl) -> Result<Box<dyn Operation>> {
        self.build(format!("revert upgrade to {charm_url}"), Self::queue_upgrade_hook)
    }

    fn new_resolved_upgrade(&self, charm_url: &CharmUrl) -> Result<Box<dyn Operation>> {
        self.build(format!("resolved upgrade to {charm_url}"), Self::queue_upgrade_hook)
    }

    fn new_run_hook(&self, info: &HookInfo) -> Result<Box<dyn Operation>> {
        self.build(format!("run {} hook", info.kind), Self::after_hook(info.kind))
    }

    fn new_skip_hook(&self, info: &HookInfo) -> Result<Box<dyn Operation>> {
        self.build(format!("skip {} hook", info.kind), Self::after_hook(info.kind))
    }

    fn new_action(&self, action_id: &str) -> Result<Box<dyn Operation>> {
        self.build(format!("run action {action_id}"), |prev| OperationState {
            kind: OperationKind::Continue,
            step: Step::Pending,
            started: prev.started,
            stopped: prev.stopped,
            leader: prev.leader,
            ..OperationState::default()
        })
    }

    fn new_accept_leadership(&self) -> Result<Box<dyn Operation>> {
        self.build("accept leadership".into(), |prev| OperationState {
            leader: true,
            ..prev.clone()
        })
    }

    fn new_resign_leadership(&self) -> Result<Box<dyn Operation>> {
        self.build("resign leadership".into(), |prev| OperationState {
            leader: false,
            ..prev.clone()
        })
    }
}

// ── Resolver ─────────────────────────────────────────────────────────

/// Small rule-based resolver: finish queued hooks, start the unit, follow
/// charm, config and leader-settings changes, run pending actions, and
/// finally refresh status.
#[derive(Clone, Default)]
pub struct ConvergeResolver {
    calls: Arc<Mutex<Vec<(LocalState, Snapshot)>>>,
}

impl ConvergeResolver {
    /// Local and remote state passed to each `next_op` call, in order.
    pub fn calls(&self) -> Vec<(LocalState, Snapshot)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Resolver for ConvergeResolver {
    fn next_op(
        &self,
        local: &LocalState,
        remote: &Snapshot,
        factory: &dyn Factory,
    ) -> Result<NextOp> {
        self.calls
            .lock()
            .unwrap()
            .push((local.clone(), remote.clone()));

        let op = &local.operation;
        if op.kind == OperationKind::RunHook
            && op.step == Step::Queued
            && let Some(hook) = &op.hook
        {
            return Ok(NextOp::Run(factory.new_run_hook(hook)?));
        }
        if let Some(target) = &remote.charm_url
            && local.charm_url.as_ref() != Some(target)
        {
            return Ok(NextOp::Run(factory.new_upgrade(target)?));
        }
        if !op.started {
            return Ok(NextOp::Run(
                factory.new_run_hook(&HookInfo::new(HookKind::Start))?,
            ));
        }
        if local.config_version != remote.config_version {
            return Ok(NextOp::Run(
                factory.new_run_hook(&HookInfo::new(HookKind::ConfigChanged))?,
            ));
        }
        if local.leader_settings_version != remote.leader_settings_version {
            return Ok(NextOp::Run(factory.new_run_hook(&HookInfo::new(
                HookKind::LeaderSettingsChanged,
            ))?));
        }
        if let Some(id) = remote
            .actions
            .iter()
            .find(|id| !local.completed_actions.contains(*id))
        {
            return Ok(NextOp::Run(factory.new_action(id)?));
        }
        if local.update_status_version != remote.update_status_version {
            return Ok(NextOp::Run(
                factory.new_run_hook(&HookInfo::new(HookKind::UpdateStatus))?,
            ));
        }
        Ok(NextOp::NoOperation)
    }
}

// ── Charm dir recorder ───────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingLocker(Mutex<Vec<bool>>);

impl RecordingLocker {
    pub fn history(&self) -> Vec<bool> {
        self.0.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<bool> {
        self.history().last().copied()
    }
}

impl Locker for RecordingLocker {
    fn set_available(&self, available: bool) {
        self.0.lock().unwrap().push(available);
    }
}

// ── Harness ──────────────────────────────────────────────────────────

pub struct HarnessOptions {
    pub charm_url: Option<CharmUrl>,
    pub conflicted: bool,
    pub operation: OperationState,
    pub remote: Snapshot,
    pub plan: Plan,
    /// Error message returned by the idle callback, if it should fail.
    pub idle_error: Option<&'static str>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            charm_url: None,
            conflicted: false,
            operation: settled_state(),
            remote: Snapshot::default(),
            plan: Plan::default(),
            idle_error: None,
        }
    }
}

pub struct LoopHarness {
    controls: Arc<Controls>,
    pub locker: Arc<RecordingLocker>,
    pub journal: Journal,
    idle: mpsc::UnboundedReceiver<()>,
    idle_count: Arc<AtomicUsize>,
    handle: JoinHandle<LoopExit>,
}

impl LoopHarness {
    pub fn start(resolver: impl Resolver + 'static, options: HarnessOptions) -> Self {
        let (remote_tx, watcher) = remotestate::channel(options.remote);
        let (dying_tx, dying_rx) = watch::channel(false);
        let (idle_tx, idle_rx) = mpsc::unbounded_channel();
        let idle_count = Arc::new(AtomicUsize::new(0));
        let locker = Arc::new(RecordingLocker::default());
        let journal = Journal::default();
        let controls = Arc::new(Controls {
            remote: remote_tx,
            dying: dying_tx,
        });

        let counter = Arc::clone(&idle_count);
        let idle_error = options.idle_error;
        let on_idle: IdleCallback = Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = idle_tx.send(());
            match idle_error {
                Some(message) => Err(HarnessFailure(message.into()).into()),
                None => Ok(()),
            }
        });

        let config = LoopConfig {
            resolver: Box::new(resolver),
            watcher: Box::new(watcher),
            executor: Box::new(LocalExecutor::new(options.operation)),
            factory: Box::new(HarnessFactory {
                plan: options.plan,
                journal: journal.clone(),
                controls: Arc::downgrade(&controls),
            }),
            charm_url: options.charm_url,
            conflicted: options.conflicted,
            dying: dying_rx,
            on_idle: Some(on_idle),
            charm_dir_locker: Arc::clone(&locker) as Arc<dyn Locker>,
        };

        Self {
            controls,
            locker,
            journal,
            idle: idle_rx,
            idle_count,
            handle: tokio::spawn(run_loop(config)),
        }
    }

    /// Wait until the loop reports idle once more.
    pub async fn next_idle(&mut self) {
        tokio::time::timeout(WAIT, self.idle.recv())
            .await
            .expect("loop never went idle")
            .expect("idle callback dropped");
    }

    pub fn idle_count(&self) -> usize {
        self.idle_count.load(Ordering::SeqCst)
    }

    pub fn update_remote(&self, modify: impl FnOnce(&mut Snapshot)) {
        self.controls.remote.send_modify(modify);
    }

    /// Wait for the loop to stop on its own.
    pub async fn finish(self) -> LoopExit {
        tokio::time::timeout(WAIT, self.handle)
            .await
            .expect("loop did not stop")
            .expect("loop task panicked")
    }

    /// Signal `dying` and wait for the loop to stop.
    pub async fn cancel(self) -> LoopExit {
        self.controls.dying.send_replace(true);
        self.finish().await
    }

    /// Drop both the remote state and dying senders, then wait for the loop
    /// to stop.
    pub async fn close_sources(self) -> LoopExit {
        let Self {
            controls, handle, ..
        } = self;
        drop(controls);
        tokio::time::timeout(WAIT, handle)
            .await
            .expect("loop did not stop")
            .expect("loop task panicked")
    }
}
