//! Project/agent workflows over the tmux adapter and the registry.
//!
//! The registry is ground truth for which agents exist; tmux is ground truth
//! for which of them still have a live window. Liveness is always derived,
//! never stored.

mod agents;
pub mod command;
mod io;
pub mod liveness;
mod projects;
pub mod validation;

pub use agents::{AttachResult, KillAgentResult, ListAgentsResult, SpawnOptions};
pub use io::{InterruptResult, ReadOutputResult, SendResult};
pub use liveness::{annotate_liveness, AgentStatus};
pub use projects::{
    CloseProjectResult, CreateProjectResult, OrphanWindow, ProjectSummary, ReconcileResult,
    SwitchProjectResult,
};

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde::Serialize;
use tracing::warn;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::registry::Registry;
use crate::tmux::Tmux;

use validation::validate_name;

/// tmux rewrites '.' in session names. '+' survives tmux and is outside the
/// project name grammar, so distinct projects keep distinct sessions.
pub fn session_name_for(project: &str) -> String {
    project.replace('.', "+")
}

/// Project a session belongs to, inverse of `session_name_for`
pub fn project_name_for(session: &str) -> String {
    session.replace('+', ".")
}

/// Key of the send lock guarding one window of a project
fn send_lock_key(project: &str, window_id: &str) -> String {
    format!("{}/{}", project, window_id)
}

/// Outcome of one best-effort client switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSwitch {
    pub tty: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct Orchestrator {
    config: Config,
    tmux: Tmux,
    registry: Registry,
    work_dir: PathBuf,
    send_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Orchestrator {
    pub fn new(config: Config, tmux: Tmux, registry: Registry, work_dir: PathBuf) -> Self {
        Self {
            config,
            tmux,
            registry,
            work_dir,
            send_locks: DashMap::new(),
        }
    }

    /// Build from configuration: real tmux on the configured socket, registry
    /// on the primary root (or the fallback when it isn't writable).
    pub fn from_config(config: Config) -> Result<Self> {
        let work_dir = std::env::current_dir()?;
        let tmux = Tmux::system(config.tmux_binary.clone(), config.socket_name.clone());
        let registry = Registry::open(&config.primary_root(&work_dir), &config.fallback_root())?;
        Ok(Self::new(config, tmux, registry, work_dir))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tmux(&self) -> &Tmux {
        &self.tmux
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// The current-project pointer, if set
    pub fn current_project(&self) -> Option<String> {
        self.registry.current_project()
    }

    fn require_current_project(&self) -> Result<String> {
        self.registry
            .current_project()
            .ok_or_else(AppError::no_current_project)
    }

    /// Explicit project (validated) or the current one
    fn resolve_project(&self, explicit: Option<&str>) -> Result<String> {
        match explicit {
            Some(name) => {
                validate_name("project", name)?;
                Ok(name.to_string())
            }
            None => self.require_current_project(),
        }
    }

    /// Session name for `project`, failing with SessionNotFound if it isn't live
    fn require_session(&self, project: &str) -> Result<String> {
        let session = session_name_for(project);
        if !self.tmux.session_exists(&session)? {
            return Err(AppError::session_not_found(session));
        }
        Ok(session)
    }

    /// Point every attached client at `session`; one broken client doesn't stop the rest
    fn switch_clients(&self, session: &str) -> Vec<ClientSwitch> {
        let clients = match self.tmux.list_clients() {
            Ok(clients) => clients,
            Err(e) => {
                warn!(error = %e, "could not list clients");
                return Vec::new();
            }
        };

        clients
            .into_iter()
            .map(|tty| match self.tmux.switch_client(&tty, session) {
                Ok(()) => ClientSwitch {
                    tty,
                    ok: true,
                    error: None,
                },
                Err(e) => {
                    warn!(tty = %tty, session, error = %e, "client switch failed");
                    ClientSwitch {
                        tty,
                        ok: false,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect()
    }

    /// Lock serializing text+Enter delivery to one target within this process
    fn send_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.send_locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Forget the send locks of every window in a project
    fn drop_send_locks(&self, project: &str) {
        let prefix = format!("{}/", project);
        self.send_locks.retain(|key, _| !key.starts_with(&prefix));
    }
}
