//! Agent lifecycle: spawn, list, attach, kill

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::command::resolve_start_command;
use super::liveness::{annotate_liveness, AgentStatus};
use super::validation::validate_name;
use super::{send_lock_key, session_name_for, ClientSwitch, Orchestrator};
use crate::config::{AgentType, StartCommand};
use crate::constants::{TAG_AGENT_ID, TAG_AGENT_NAME, TAG_AGENT_TYPE};
use crate::error::{AppError, Result};
use crate::registry::AgentEntry;
use crate::tmux::WindowInfo;
use crate::utils::paths::absolutize;

/// Optional spawn parameters
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    /// Working directory; defaults to the project's cwd, then the process cwd
    pub cwd: Option<PathBuf>,
    /// Replaces the type's program (first word) and base args (the rest)
    pub command: Option<String>,
    /// Always appended after the base args
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAgentsResult {
    pub project: String,
    pub session_exists: bool,
    pub agents: Vec<AgentStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachResult {
    pub project: String,
    pub agent: String,
    pub window_id: String,
    pub selected: bool,
    pub clients: Vec<ClientSwitch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KillAgentResult {
    pub project: String,
    pub agent: String,
    pub window_killed: bool,
}

impl Orchestrator {
    /// Spawn an agent window in the current project.
    ///
    /// The registry entry is written last, after the window is tagged and its
    /// output is piped to the log. If any step after window creation fails the
    /// window is killed again (best effort); `reconcile_project` reports any
    /// window that survives such a failure.
    pub fn spawn_agent(&self, agent_type: &str, name: &str, options: &SpawnOptions) -> Result<AgentEntry> {
        let project = self.require_current_project()?;
        validate_name("agent", name)?;
        let agent_type: AgentType = agent_type.parse()?;
        let session = self.require_session(&project)?;

        let mut agents = self.registry.load_agents(&project);
        if agents.find(name).is_some() {
            return Err(AppError::agent_already_exists(&project, name));
        }

        let cwd = self.spawn_cwd(&project, options.cwd.as_deref());
        let command = resolve_start_command(
            &self.config.start_command(agent_type),
            options.command.as_deref(),
            &options.args,
        )?;

        let window = self.tmux.create_window(
            &session,
            name,
            Some(cwd.as_path()),
            Some(command.program.as_str()),
            &command.args,
        )?;

        let instance_id = uuid::Uuid::new_v4().simple().to_string();
        let mut finish = || -> Result<AgentEntry> {
            self.tmux.set_window_tag(&window.window_id, TAG_AGENT_ID, &instance_id)?;
            self.tmux.set_window_tag(&window.window_id, TAG_AGENT_NAME, name)?;
            self.tmux
                .set_window_tag(&window.window_id, TAG_AGENT_TYPE, agent_type.as_str())?;
            let pane_id = self.tmux.first_pane_id(&window.window_id)?;

            let log_path = self.registry.ensure_agent_log(&project, name)?;
            let sink = format!("cat >> {}", shell_escape::escape(log_path.to_string_lossy()));
            self.tmux.pipe_output_to(&pane_id, &sink, true)?;

            let entry = new_entry(
                &project,
                name,
                agent_type,
                &instance_id,
                &window,
                pane_id,
                &cwd,
                &command,
                &log_path,
            );
            agents.agents.push(entry.clone());
            self.registry.save_agents(&project, &mut agents)?;
            Ok(entry)
        };

        match finish() {
            Ok(entry) => {
                info!(
                    project = %project,
                    agent = name,
                    agent_type = %agent_type,
                    window = %entry.window_id,
                    "agent spawned"
                );
                Ok(entry)
            }
            Err(e) => {
                warn!(project = %project, agent = name, error = %e, "spawn failed, removing window");
                if let Err(kill_err) = self.tmux.kill_window(&window.window_id) {
                    warn!(window = %window.window_id, error = %kill_err, "rollback kill failed");
                }
                Err(e)
            }
        }
    }

    fn spawn_cwd(&self, project: &str, explicit: Option<&Path>) -> PathBuf {
        if let Some(dir) = explicit {
            return absolutize(dir, &self.work_dir);
        }
        self.registry
            .load_project_meta(project)
            .and_then(|m| m.cwd)
            .map(PathBuf::from)
            .unwrap_or_else(|| self.work_dir.clone())
    }

    /// Registry agents of a project, each annotated with whether its window is live
    pub fn list_agents(&self, project: Option<&str>) -> Result<ListAgentsResult> {
        let project = self.resolve_project(project)?;
        let session = session_name_for(&project);

        let session_exists = self.tmux.session_exists(&session)?;
        let live: HashMap<String, String> = if session_exists {
            self.tmux
                .list_window_tags(&session, TAG_AGENT_ID)?
                .into_iter()
                .filter_map(|(id, tag)| tag.map(|tag| (id, tag)))
                .collect()
        } else {
            HashMap::new()
        };

        let agents = annotate_liveness(self.registry.load_agents(&project).agents, &live);
        Ok(ListAgentsResult {
            project,
            session_exists,
            agents,
        })
    }

    /// Bring an agent's window to the front for attached clients (best effort)
    pub fn attach_agent(&self, name: &str) -> Result<AttachResult> {
        let project = self.require_current_project()?;
        validate_name("agent", name)?;
        let session = self.require_session(&project)?;

        let agents = self.registry.load_agents(&project);
        let agent = agents
            .find(name)
            .ok_or_else(|| AppError::agent_not_found(&project, name))?;
        let window_id = agent.window_id.clone();

        let selected = self.window_is_current(agent)
            && match self.tmux.select_window(&window_id) {
                Ok(()) => true,
                Err(e) => {
                    warn!(agent = name, window = %window_id, error = %e, "select-window failed");
                    false
                }
            };
        let clients = self.switch_clients(&session);

        Ok(AttachResult {
            project,
            agent: name.to_string(),
            window_id,
            selected,
            clients,
        })
    }

    /// Kill the agent's window (best effort) and drop its registry entry
    pub fn kill_agent(&self, name: &str) -> Result<KillAgentResult> {
        let project = self.require_current_project()?;
        validate_name("agent", name)?;

        let mut agents = self.registry.load_agents(&project);
        let agent = agents
            .find(name)
            .ok_or_else(|| AppError::agent_not_found(&project, name))?;
        let window_id = agent.window_id.clone();

        let window_killed = self.window_is_current(agent)
            && match self.tmux.kill_window(&window_id) {
                Ok(()) => true,
                Err(e) => {
                    warn!(agent = name, window = %window_id, error = %e, "kill-window failed");
                    false
                }
            };

        agents.remove(name);
        self.registry.save_agents(&project, &mut agents)?;
        self.send_locks.remove(&send_lock_key(&project, &window_id));

        info!(project = %project, agent = name, window_killed, "agent killed");
        Ok(KillAgentResult {
            project,
            agent: name.to_string(),
            window_killed,
        })
    }

    /// Whether the agent's recorded window still exists and is the one it was
    /// spawned into. Window ids are reused once the tmux server restarts, so
    /// the id alone can point at somebody else's window.
    pub(crate) fn window_is_current(&self, agent: &AgentEntry) -> bool {
        if agent.instance_id.is_empty() {
            return false;
        }
        match self.tmux.read_window_tag(&agent.window_id, TAG_AGENT_ID) {
            Ok(tag) => tag.as_deref() == Some(agent.instance_id.as_str()),
            Err(e) => {
                warn!(agent = %agent.name, window = %agent.window_id, error = %e, "window check failed");
                false
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn new_entry(
    project: &str,
    name: &str,
    agent_type: AgentType,
    instance_id: &str,
    window: &WindowInfo,
    pane_id: String,
    cwd: &Path,
    command: &StartCommand,
    log_path: &Path,
) -> AgentEntry {
    AgentEntry {
        name: name.to_string(),
        agent_type,
        project: project.to_string(),
        instance_id: instance_id.to_string(),
        window_id: window.window_id.clone(),
        window_index: window.window_index,
        window_name: window.window_name.clone(),
        pane_id: Some(pane_id),
        cwd: cwd.to_string_lossy().to_string(),
        command: command.program.clone(),
        args: command.args.clone(),
        log_path: log_path.to_string_lossy().to_string(),
        created_at: Utc::now(),
    }
}
