pub mod executor;
pub mod state;
pub mod state_file;
pub mod traits;

pub use executor::LocalExecutor;
pub use state::{OperationKind, OperationState, StateError, Step};
pub use state_file::StateFile;
pub use traits::{Executor, Factory, Operation, PhaseFuture};
