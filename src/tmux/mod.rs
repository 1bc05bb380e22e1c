//! tmux backend adapter
//!
//! Every operation is one (or a short fixed sequence of) `tmux -L <socket> ...`
//! invocations. All raw-text parsing of tmux replies lives in this module; it
//! knows nothing about projects or agents.

pub mod capture;
pub mod clients;
pub mod session;
pub mod terminal_input;
pub mod window;

use std::sync::Arc;

use tracing::debug;

use crate::error::{AppError, Result};
use crate::shell::{render_command, CommandOutput, CommandRunner, SystemRunner};

pub use session::CreatedSession;
pub use window::WindowInfo;

/// Handle to a private tmux server
#[derive(Clone)]
pub struct Tmux {
    binary: String,
    socket: String,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for Tmux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tmux")
            .field("binary", &self.binary)
            .field("socket", &self.socket)
            .finish()
    }
}

impl Tmux {
    pub fn new(
        binary: impl Into<String>,
        socket: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            binary: binary.into(),
            socket: socket.into(),
            runner,
        }
    }

    /// Adapter backed by real process execution
    pub fn system(binary: impl Into<String>, socket: impl Into<String>) -> Self {
        Self::new(binary, socket, Arc::new(SystemRunner))
    }

    pub fn socket_name(&self) -> &str {
        &self.socket
    }

    fn full_args(&self, args: &[&str]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 2);
        full.push("-L".to_string());
        full.push(self.socket.clone());
        full.extend(args.iter().map(|a| a.to_string()));
        full
    }

    /// Run a tmux subcommand and return its raw output, whatever the exit status.
    /// Use this where a non-zero exit is a normal answer (existence checks).
    pub(crate) fn exec(&self, args: &[&str]) -> Result<CommandOutput> {
        let full = self.full_args(args);
        debug!(command = %render_command(&self.binary, &full), "tmux");
        self.runner.run(&self.binary, &full)
    }

    /// Run a tmux subcommand, turning a non-zero exit into `BackendCommandError`.
    /// Returns stdout on success.
    pub(crate) fn check(&self, args: &[&str]) -> Result<String> {
        let output = self.exec(args)?;
        if !output.success {
            let full = self.full_args(args);
            return Err(AppError::backend_command(
                &render_command(&self.binary, &full),
                output.exit_code,
                &output.diagnostic(),
            ));
        }
        Ok(output.stdout)
    }
}

/// Exact-match session target (`=name`), so `demo` never matches `demo2`
pub fn session_target(session: &str) -> String {
    format!("={}", session)
}
