//! Task execution engine

pub mod engine;
pub mod executor;

pub use engine::{EventHandler, ExecutionError, ExecutionEvent, TaskEngine};
pub use executor::{StepExecutor, StepOutcome};
