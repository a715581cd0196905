use super::state::OperationState;
use super::state_file::StateFile;
use super::traits::{Executor, Operation, PhaseFuture};
use anyhow::{Context, Result};
use std::future::Future;
use std::pin::Pin;

#[derive(Debug, Clone, Copy, strum::Display)]
#[strum(serialize_all = "lowercase")]
enum Phase {
    Prepare,
    Execute,
    Commit,
}

impl Phase {
    fn run<'a>(self, op: &'a mut dyn Operation, state: &'a OperationState) -> PhaseFuture<'a> {
        match self {
            Self::Prepare => op.prepare(state),
            Self::Execute => op.execute(state),
            Self::Commit => op.commit(state),
        }
    }
}

/// In-process executor that writes each new state through an optional
/// [`StateFile`] before moving to the next phase.
pub struct LocalExecutor {
    state: OperationState,
    file: Option<StateFile>,
}

impl LocalExecutor {
    pub fn new(initial: OperationState) -> Self {
        Self {
            state: initial,
            file: None,
        }
    }

    /// Load state from `file`, falling back to `initial` when the file does
    /// not exist yet.
    pub async fn with_state_file(file: StateFile, initial: OperationState) -> Result<Self> {
        let state = match file.read().await {
            Ok(state) => state,
            Err(super::state::StateError::NotFound(_)) => initial,
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            state,
            file: Some(file),
        })
    }

    async fn write_state(&mut self, state: OperationState) -> Result<()> {
        state.validate()?;
        if let Some(file) = &self.file {
            file.write(&state).await?;
        }
        self.state = state;
        Ok(())
    }

    async fn run_phases(&mut self, mut op: Box<dyn Operation>) -> Result<()> {
        let description = op.describe();
        tracing::info!(operation = %description, "running operation");

        for phase in [Phase::Prepare, Phase::Execute, Phase::Commit] {
            tracing::debug!(operation = %description, %phase, "operation phase");
            let current = self.state.clone();
            let next = phase
                .run(op.as_mut(), &current)
                .await
                .with_context(|| format!("{phase} {description}"))?;
            if let Some(next) = next {
                self.write_state(next)
                    .await
                    .with_context(|| format!("writing state after {phase} {description}"))?;
            }
        }
        op.committed();
        Ok(())
    }
}

impl Executor for LocalExecutor {
    fn run(&mut self, op: Box<dyn Operation>) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.run_phases(op))
    }

    fn state(&self) -> OperationState {
        self.state.clone()
    }
}
