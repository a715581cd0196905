use thiserror::Error;

pub use crate::uniter::charm::CharmUrlError;
pub use crate::uniter::charmdir::CharmDirError;
pub use crate::uniter::hook::HookError;
pub use crate::uniter::operation::StateError;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for the unit agent.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; operations, factories, executors and
/// resolvers use `anyhow::Result` at their seams.
#[derive(Debug, Error)]
pub enum AgentError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Resolver loop ────────────────────────────────────────────────────
    #[error("resolver loop: {0}")]
    Loop(#[from] LoopError),

    // ── Operation state ──────────────────────────────────────────────────
    #[error("operation state: {0}")]
    State(#[from] StateError),

    // ── Charm directory ──────────────────────────────────────────────────
    #[error("charm directory: {0}")]
    CharmDir(#[from] CharmDirError),

    // ── Charm identifiers ────────────────────────────────────────────────
    #[error("charm url: {0}")]
    CharmUrl(#[from] CharmUrlError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Resolver loop errors ───────────────────────────────────────────────────

/// Fatal conditions that stop the resolver loop.
///
/// Collaborator failures are carried untouched: `Display`, `source` and
/// `downcast_ref` all reach the original error.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error(transparent)]
    Resolver(anyhow::Error),

    #[error(transparent)]
    Execution(anyhow::Error),

    #[error(transparent)]
    Idle(anyhow::Error),

    #[error("remote state watcher stopped")]
    WatcherClosed,
}
