//! Project lifecycle: create, list, switch, close, reconcile

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use super::validation::validate_name;
use super::{project_name_for, session_name_for, ClientSwitch, Orchestrator};
use crate::constants::{TAG_AGENT_ID, TAG_AGENT_NAME, TAG_AGENT_TYPE};
use crate::error::Result;
use crate::registry::ProjectMetaUpdate;
use crate::utils::paths::absolutize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectResult {
    pub project: String,
    pub session: String,
    pub cwd: Option<String>,
    /// The tmux session was newly created
    pub created: bool,
    /// The registry directory was newly created
    pub registry_created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub name: String,
    pub session_exists: bool,
    pub has_registry: bool,
    pub is_current: bool,
    pub cwd: Option<String>,
    pub window_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchProjectResult {
    pub project: String,
    pub session: String,
    pub clients: Vec<ClientSwitch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseProjectResult {
    pub project: String,
    pub session_killed: bool,
    pub cleared_current: bool,
}

/// Live window carrying our name tag but missing from the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanWindow {
    pub window_id: String,
    pub window_index: u32,
    pub window_name: String,
    pub agent_name: String,
    pub agent_type: Option<String>,
    pub killed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResult {
    pub project: String,
    pub session_exists: bool,
    pub orphans: Vec<OrphanWindow>,
}

impl Orchestrator {
    /// Create (or re-create) a project: registry entry, tmux session, current pointer.
    /// `created` reports the session, `registry_created` the registry; they can differ.
    pub fn create_project(&self, name: &str, cwd: Option<&Path>) -> Result<CreateProjectResult> {
        validate_name("project", name)?;

        let cwd: Option<PathBuf> = cwd.map(|p| absolutize(p, &self.work_dir));
        let ensured = self
            .registry
            .ensure_project(name, &ProjectMetaUpdate { cwd: cwd.clone() })?;

        let session_cwd = ensured.meta.cwd.as_deref().map(Path::new);
        let session = session_name_for(name);
        let outcome = self.tmux.create_session(&session, session_cwd)?;

        self.registry.set_current_project(name)?;

        info!(
            project = name,
            session = %session,
            created = outcome.created,
            registry_created = ensured.created,
            "project ready"
        );

        Ok(CreateProjectResult {
            project: name.to_string(),
            session,
            cwd: ensured.meta.cwd,
            created: outcome.created,
            registry_created: ensured.created,
        })
    }

    /// Every project known to either side: registry directories and live sessions.
    /// Sessions with no registry entry are listed under the session name.
    pub fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        let registered = self.registry.list_project_names();
        let mut live = self.tmux.list_sessions()?;
        let current = self.registry.current_project();

        let mut summaries: BTreeMap<String, ProjectSummary> = BTreeMap::new();

        for name in registered {
            let session = session_name_for(&name);
            let session_exists = live.remove(&session);
            let cwd = self.registry.load_project_meta(&name).and_then(|m| m.cwd);
            summaries.insert(
                name.clone(),
                ProjectSummary {
                    window_count: self.live_window_count(&session, session_exists),
                    is_current: current.as_deref() == Some(name.as_str()),
                    name,
                    session_exists,
                    has_registry: true,
                    cwd,
                },
            );
        }

        for session in live {
            let name = project_name_for(&session);
            if summaries.contains_key(&name) {
                continue;
            }
            summaries.insert(
                name.clone(),
                ProjectSummary {
                    window_count: self.live_window_count(&session, true),
                    is_current: current.as_deref() == Some(name.as_str()),
                    name,
                    session_exists: true,
                    has_registry: false,
                    cwd: None,
                },
            );
        }

        Ok(summaries.into_values().collect())
    }

    fn live_window_count(&self, session: &str, session_exists: bool) -> usize {
        if !session_exists {
            return 0;
        }
        match self.tmux.list_windows(session) {
            Ok(windows) => windows.len(),
            Err(e) => {
                warn!(session, error = %e, "could not count windows");
                0
            }
        }
    }

    /// Make `name` current and point attached clients at its session
    pub fn switch_project(&self, name: &str) -> Result<SwitchProjectResult> {
        validate_name("project", name)?;
        let session = self.require_session(name)?;

        self.registry.set_current_project(name)?;
        let clients = self.switch_clients(&session);

        info!(project = name, clients = clients.len(), "switched project");
        Ok(SwitchProjectResult {
            project: name.to_string(),
            session,
            clients,
        })
    }

    /// Kill the project's session (best effort). Registry files stay for history.
    pub fn close_project(&self, name: &str) -> Result<CloseProjectResult> {
        validate_name("project", name)?;
        let session = session_name_for(name);

        let session_killed = match self.tmux.session_exists(&session) {
            Ok(true) => match self.tmux.kill_session(&session) {
                Ok(()) => true,
                Err(e) => {
                    warn!(project = name, error = %e, "failed to kill session");
                    false
                }
            },
            Ok(false) => false,
            Err(e) => {
                warn!(project = name, error = %e, "could not check session");
                false
            }
        };

        self.drop_send_locks(name);

        let cleared_current = self.registry.current_project().as_deref() == Some(name);
        if cleared_current {
            self.registry.clear_current_project()?;
        }

        info!(project = name, session_killed, cleared_current, "project closed");
        Ok(CloseProjectResult {
            project: name.to_string(),
            session_killed,
            cleared_current,
        })
    }

    /// Find tagged windows with no registry entry, left behind by a spawn that
    /// failed after the window was created. With `kill_orphans` they are killed,
    /// best effort. Never writes registry entries.
    pub fn reconcile_project(&self, project: Option<&str>, kill_orphans: bool) -> Result<ReconcileResult> {
        let project = self.resolve_project(project)?;
        let session = session_name_for(&project);

        if !self.tmux.session_exists(&session)? {
            return Ok(ReconcileResult {
                project,
                session_exists: false,
                orphans: Vec::new(),
            });
        }

        let known: HashSet<String> = self
            .registry
            .load_agents(&project)
            .agents
            .into_iter()
            .map(|a| a.instance_id)
            .filter(|id| !id.is_empty())
            .collect();

        let mut orphans = Vec::new();
        for window in self.tmux.list_windows(&session)? {
            let instance = self.tmux.read_window_tag(&window.window_id, TAG_AGENT_ID)?;
            if instance.is_some_and(|id| known.contains(&id)) {
                continue;
            }
            let agent_name = match self.tmux.read_window_tag(&window.window_id, TAG_AGENT_NAME)? {
                Some(name) => name,
                None => continue,
            };
            let agent_type = self.tmux.read_window_tag(&window.window_id, TAG_AGENT_TYPE)?;

            let killed = kill_orphans
                && match self.tmux.kill_window(&window.window_id) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(window = %window.window_id, error = %e, "failed to kill orphan window");
                        false
                    }
                };

            orphans.push(OrphanWindow {
                window_id: window.window_id,
                window_index: window.window_index,
                window_name: window.window_name,
                agent_name,
                agent_type,
                killed,
            });
        }

        if !orphans.is_empty() {
            info!(project = %project, orphans = orphans.len(), kill_orphans, "reconciled project");
        }
        Ok(ReconcileResult {
            project,
            session_exists: true,
            orphans,
        })
    }
}
