//! Core domain models
//!
//! Configuration, the task/step model, CI guards and credential files.

pub mod command;
pub mod config;
pub mod context;
pub mod credentials;
pub mod environment;
pub mod guard;
pub mod host;
pub mod state;
pub mod task;

pub use command::*;
pub use context::*;
pub use state::*;
pub use task::*;
