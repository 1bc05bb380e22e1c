//! Presentation operations on attached clients.
//! Callers treat every failure here as advisory.

use super::{session_target, Tmux};
use crate::error::Result;

impl Tmux {
    /// ttys of clients attached to the private server (empty when no server runs)
    pub fn list_clients(&self) -> Result<Vec<String>> {
        let output = self.exec(&["list-clients", "-F", "#{client_tty}"])?;
        if !output.success {
            return Ok(Vec::new());
        }
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Point one client at a session
    pub fn switch_client(&self, tty: &str, session: &str) -> Result<()> {
        let target = session_target(session);
        self.check(&["switch-client", "-c", tty, "-t", &target])?;
        Ok(())
    }

    /// Make a window the current one in its session
    pub fn select_window(&self, target: &str) -> Result<()> {
        self.check(&["select-window", "-t", target])?;
        Ok(())
    }
}
