//! Pane output: rendered snapshots and continuous redirection

use super::Tmux;
use crate::error::Result;

impl Tmux {
    /// Rendered (escape-free) pane content including the last `history_lines`
    /// lines of scrollback. Wrapped lines are joined.
    pub fn capture_rendered(&self, pane: &str, history_lines: usize) -> Result<String> {
        let start = format!("-{}", history_lines);
        self.check(&["capture-pane", "-p", "-J", "-t", pane, "-S", &start])
    }

    /// Pipe the pane's output stream into `shell_command`.
    ///
    /// With `only_if_not_running` an existing pipe is left alone (`-o`);
    /// otherwise an existing pipe is replaced.
    pub fn pipe_output_to(
        &self,
        pane: &str,
        shell_command: &str,
        only_if_not_running: bool,
    ) -> Result<()> {
        let mut args = vec!["pipe-pane"];
        if only_if_not_running {
            args.push("-o");
        }
        args.extend(["-t", pane, shell_command]);
        self.check(&args)?;
        Ok(())
    }
}
