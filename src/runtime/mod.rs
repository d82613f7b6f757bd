//! Application context and the launch flow.
mod context;
mod startup;

pub use context::AppContext;
pub use startup::{child_exit_code, run_launch, RuntimeExit};
