mod builtins;
mod engine;
mod status;

pub use builtins::{BuiltinCommand, BuiltinManager};
pub use engine::{Engine, Executor};
pub use status::{ExecError, ExecStatus, Status};
