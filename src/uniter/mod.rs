//! Unit agent internals: charm identity, operations, remote state, and the
//! resolver loop that ties them together.

pub mod charm;
pub mod charmdir;
pub mod hook;
pub mod operation;
pub mod remotestate;
pub mod resolver;

pub use charm::CharmUrl;
pub use charmdir::{CharmDir, Locker};
pub use hook::{HookInfo, HookKind};
pub use resolver::{LocalState, LoopConfig, LoopExit, LoopOutcome, NextOp, Resolver, run_loop};
