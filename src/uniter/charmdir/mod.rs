use std::sync::{PoisonError, RwLock};

/// Publishes whether the charm directory may currently be read.
///
/// Only the resolver loop writes through this; everything else reads via
/// [`CharmDir`].
pub trait Locker: Send + Sync {
    fn set_available(&self, available: bool);
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CharmDirError {
    #[error("charm directory is not available")]
    NotAvailable,
}

/// Shared availability flag for the charm directory.
///
/// Consumers run their work through [`CharmDir::run`], which holds a read
/// lock for the duration; flipping availability takes the write lock and so
/// waits for in-flight consumers to finish.
#[derive(Debug, Default)]
pub struct CharmDir {
    available: RwLock<bool>,
}

impl CharmDir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        *self.available.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` only while the charm directory is available.
    pub fn run<T, F>(&self, f: F) -> Result<T, CharmDirError>
    where
        F: FnOnce() -> T,
    {
        let guard = self.available.read().unwrap_or_else(PoisonError::into_inner);
        if !*guard {
            return Err(CharmDirError::NotAvailable);
        }
        Ok(f())
    }
}

impl Locker for CharmDir {
    fn set_available(&self, available: bool) {
        *self.available.write().unwrap_or_else(PoisonError::into_inner) = available;
    }
}
