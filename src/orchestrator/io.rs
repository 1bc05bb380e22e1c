//! Agent I/O: text delivery, rendered output, interrupts

use std::thread;

use serde::Serialize;
use tracing::debug;

use super::validation::validate_name;
use super::{send_lock_key, Orchestrator};
use crate::error::{AppError, Result};
use crate::registry::AgentEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub project: String,
    /// Agent name or window the caller addressed
    pub target: String,
    pub window_id: String,
    pub pane_id: String,
    /// UTF-8 byte length of the text sent (the Enter key is not counted)
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOutputResult {
    pub project: String,
    pub agent: String,
    /// Number of lines actually returned
    pub lines: usize,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterruptResult {
    pub project: String,
    pub agent: String,
    pub pane_id: String,
}

/// Last `n` non-blank lines of a rendered capture
fn tail_non_blank(text: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let skip = lines.len().saturating_sub(n);
    lines[skip..].to_vec()
}

/// Scrollback to capture for `lines` non-blank lines; blank rows are trimmed afterwards
fn history_for(lines: usize) -> usize {
    lines.saturating_mul(3).max(lines.saturating_add(100))
}

impl Orchestrator {
    /// Type `text` into an agent's pane and press Enter
    pub fn send_to_agent(&self, name: &str, text: &str) -> Result<SendResult> {
        let (project, agent) = self.find_agent(name)?;
        let pane_id = self.agent_pane(&project, &agent)?;
        self.deliver(&project, &agent.window_id, &pane_id, text)?;

        Ok(SendResult {
            project,
            target: name.to_string(),
            window_id: agent.window_id,
            pane_id,
            bytes: text.len(),
        })
    }

    /// Type `text` into any window of the current project's session, addressed
    /// by window name, `@id` or index
    pub fn send_to_window(&self, window: &str, text: &str) -> Result<SendResult> {
        let project = self.require_current_project()?;
        let session = self.require_session(&project)?;

        let info = self
            .tmux
            .list_windows(&session)?
            .into_iter()
            .find(|w| {
                w.window_id == window
                    || w.window_name == window
                    || w.window_index.to_string() == window
            })
            .ok_or_else(|| AppError::window_not_found(&project, window))?;

        let pane_id = self.tmux.first_pane_id(&info.window_id)?;
        self.deliver(&project, &info.window_id, &pane_id, text)?;

        Ok(SendResult {
            project,
            target: window.to_string(),
            window_id: info.window_id,
            pane_id,
            bytes: text.len(),
        })
    }

    /// Recent non-blank lines of an agent's rendered pane. `None` means the
    /// configured default; counts above the configured maximum are clamped.
    pub fn read_agent_output(&self, name: &str, lines: Option<usize>) -> Result<ReadOutputResult> {
        let (project, agent) = self.find_agent(name)?;
        let wanted = lines
            .unwrap_or(self.config.default_read_lines)
            .min(self.config.max_read_lines);

        if wanted == 0 {
            return Ok(ReadOutputResult {
                project,
                agent: name.to_string(),
                lines: 0,
                output: String::new(),
            });
        }

        let pane_id = self.agent_pane(&project, &agent)?;
        let captured = self.tmux.capture_rendered(&pane_id, history_for(wanted))?;
        let tail = tail_non_blank(&captured, wanted);

        Ok(ReadOutputResult {
            project,
            agent: name.to_string(),
            lines: tail.len(),
            output: tail.join("\n"),
        })
    }

    /// Send Ctrl-C to an agent's pane. Registry state is unchanged.
    pub fn interrupt_agent(&self, name: &str) -> Result<InterruptResult> {
        let (project, agent) = self.find_agent(name)?;
        let pane_id = self.agent_pane(&project, &agent)?;
        self.tmux.send_key(&pane_id, "C-c")?;

        debug!(project = %project, agent = name, pane = %pane_id, "interrupt sent");
        Ok(InterruptResult {
            project,
            agent: name.to_string(),
            pane_id,
        })
    }

    /// Current project and the named agent's registry entry
    fn find_agent(&self, name: &str) -> Result<(String, AgentEntry)> {
        let project = self.require_current_project()?;
        validate_name("agent", name)?;
        let agent = self
            .registry
            .load_agents(&project)
            .remove(name)
            .ok_or_else(|| AppError::agent_not_found(&project, name))?;
        Ok((project, agent))
    }

    /// Stored pane id, or a fresh lookup when the entry has none.
    /// `WINDOW_NOT_FOUND` once the agent's own window is gone.
    fn agent_pane(&self, project: &str, agent: &AgentEntry) -> Result<String> {
        if !self.window_is_current(agent) {
            return Err(AppError::window_not_found(project, &agent.window_id));
        }
        match &agent.pane_id {
            Some(pane) => Ok(pane.clone()),
            None => self.tmux.first_pane_id(&agent.window_id),
        }
    }

    /// Literal text, settle delay, then Enter, holding the target's send lock throughout
    fn deliver(&self, project: &str, window_id: &str, pane_id: &str, text: &str) -> Result<()> {
        let lock = self.send_lock(&send_lock_key(project, window_id));
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        self.tmux.exit_copy_mode_if_needed(pane_id);
        if !text.is_empty() {
            self.tmux.send_literal_keys(pane_id, text)?;
        }

        let settle = self.config.send_settle();
        if !settle.is_zero() {
            thread::sleep(settle);
        }
        self.tmux.send_key(pane_id, "Enter")?;

        debug!(project, window = window_id, bytes = text.len(), "text delivered");
        Ok(())
    }
}
