use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use super::{session_target, Tmux};
use crate::error::Result;

/// Outcome of an idempotent session create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreatedSession {
    pub created: bool,
}

impl Tmux {
    /// List all session names on the private server
    pub fn list_sessions(&self) -> Result<BTreeSet<String>> {
        let output = self.exec(&["list-sessions", "-F", "#{session_name}"])?;

        if !output.success {
            // No sessions running (tmux returns error if no server is running)
            return Ok(BTreeSet::new());
        }

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Check if a tmux session exists
    pub fn session_exists(&self, session: &str) -> Result<bool> {
        let target = session_target(session);
        let output = self.exec(&["has-session", "-t", &target])?;
        Ok(output.success)
    }

    /// Create a detached session. Returns `created: false` if it already exists.
    pub fn create_session(&self, session: &str, cwd: Option<&Path>) -> Result<CreatedSession> {
        if self.session_exists(session)? {
            return Ok(CreatedSession { created: false });
        }

        let cwd = cwd.map(|p| p.to_string_lossy().to_string());
        let mut args = vec!["new-session", "-d", "-s", session];
        if let Some(dir) = cwd.as_deref() {
            args.push("-c");
            args.push(dir);
        }
        self.check(&args)?;

        Ok(CreatedSession { created: true })
    }

    /// Kill a tmux session. Fails if the session doesn't exist.
    pub fn kill_session(&self, session: &str) -> Result<()> {
        let target = session_target(session);
        self.check(&["kill-session", "-t", &target])?;
        Ok(())
    }
}
