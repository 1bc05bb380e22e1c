//! Project/agent orchestration over a private tmux server.
//!
//! A project is a tmux session, an agent is a window in it. The on-disk
//! registry records every agent spawned; tmux decides which are still alive.

// Module declarations
pub mod config;
pub mod constants;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod shell;
pub mod tmux;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for the outer collaborator
pub use config::{AgentType, Config};
pub use error::{AppError, ErrorCode, Result};
pub use orchestrator::{Orchestrator, SpawnOptions};
pub use registry::Registry;
pub use tmux::Tmux;
