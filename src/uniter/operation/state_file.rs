use super::state::{OperationState, StateError};
use std::path::{Path, PathBuf};

/// JSON file holding the executor's operation state between agent restarts.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }

    pub async fn read(&self) -> Result<OperationState, StateError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StateError::NotFound(self.display()));
            }
            Err(source) => {
                return Err(StateError::Io {
                    path: self.display(),
                    source,
                });
            }
        };
        let state: OperationState =
            serde_json::from_slice(&data).map_err(|source| StateError::Decode {
                path: self.display(),
                source,
            })?;
        state.validate()?;
        Ok(state)
    }

    /// Validates `state` and replaces the file contents via temp file + rename.
    pub async fn write(&self, state: &OperationState) -> Result<(), StateError> {
        state.validate()?;
        let io_err = |source| StateError::Io {
            path: self.display(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let data = serde_json::to_vec_pretty(state).map_err(|source| StateError::Decode {
            path: self.display(),
            source,
        })?;
        let tmp = self.path.with_extension("preparing");
        tokio::fs::write(&tmp, data).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        tracing::debug!(path = %self.path.display(), kind = %state.kind, step = %state.step, "wrote operation state");
        Ok(())
    }
}
