use crate::uniter::operation::{Operation, OperationState, PhaseFuture};

type CommitCallback = Box<dyn FnMut() + Send>;

/// An operation carrying callbacks that run after its commit is persisted.
///
/// Each [`OnCommit::wrap`] adds an outer layer that owns the previous one.
/// `commit` only reaches the base operation. The callbacks fire from
/// [`Operation::committed`], outermost layer first, so a commit whose state
/// could not be written leaves them untouched.
pub enum OnCommit {
    Base(Box<dyn Operation>),
    Wrapped {
        inner: Box<OnCommit>,
        callback: CommitCallback,
    },
}

impl OnCommit {
    pub fn new(op: Box<dyn Operation>) -> Self {
        Self::Base(op)
    }

    #[must_use]
    pub fn wrap<F>(self, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::Wrapped {
            inner: Box::new(self),
            callback: Box::new(callback),
        }
    }

    fn base(&self) -> &dyn Operation {
        match self {
            Self::Base(op) => op.as_ref(),
            Self::Wrapped { inner, .. } => inner.base(),
        }
    }

    fn base_mut(&mut self) -> &mut dyn Operation {
        match self {
            Self::Base(op) => op.as_mut(),
            Self::Wrapped { inner, .. } => inner.base_mut(),
        }
    }

    fn fire_callbacks(&mut self) {
        if let Self::Wrapped { inner, callback } = self {
            callback();
            inner.fire_callbacks();
        }
    }
}

impl Operation for OnCommit {
    fn describe(&self) -> String {
        self.base().describe()
    }

    fn prepare<'a>(&'a mut self, state: &'a OperationState) -> PhaseFuture<'a> {
        self.base_mut().prepare(state)
    }

    fn execute<'a>(&'a mut self, state: &'a OperationState) -> PhaseFuture<'a> {
        self.base_mut().execute(state)
    }

    fn commit<'a>(&'a mut self, state: &'a OperationState) -> PhaseFuture<'a> {
        self.base_mut().commit(state)
    }

    fn committed(&mut self) {
        self.fire_callbacks();
        self.base_mut().committed();
    }
}
