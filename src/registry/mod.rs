//! Persistent registry of projects, their agents and the current-project pointer.
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<project>/project.json
//! <root>/<project>/agents.json
//! <root>/<project>/logs/<agent>.log
//! <root>/current.json
//! ```
//!
//! Every write is an atomic temp-file + rename. Reads of missing or corrupt
//! files fall back to "empty" instead of failing.

mod io;
mod types;

pub use io::{atomic_write, read_json, write_json};
pub use types::{AgentEntry, AgentsFile, CurrentProject, ProjectMeta, ProjectMetaUpdate};

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::constants::{
    AGENTS_FILE, CURRENT_FILE, LOGS_DIR, MAX_NAME_LEN, PROJECT_FILE, RE_NAME,
};
use crate::error::{AppError, Result};
use crate::utils::paths::{resolve_storage_root, StorageRoot};

/// Result of `ensure_project`
#[derive(Debug, Clone, PartialEq)]
pub struct EnsuredProject {
    /// The project directory did not exist before this call
    pub created: bool,
    pub meta: ProjectMeta,
}

#[derive(Debug, Clone)]
pub struct Registry {
    root: StorageRoot,
}

impl Registry {
    /// Open the registry at `primary`, or at `fallback` if `primary` isn't writable.
    /// The choice holds for the lifetime of this value.
    pub fn open(primary: &Path, fallback: &Path) -> Result<Self> {
        let root = resolve_storage_root(primary, fallback)?;
        info!(root = %root.path.display(), fallback = root.is_fallback, "registry opened");
        Ok(Self { root })
    }

    /// Open the registry at a fixed root
    pub fn at(root: impl Into<PathBuf>) -> Result<Self> {
        let path = root.into();
        fs::create_dir_all(&path).map_err(|e| AppError::file_write(path.display().to_string(), e))?;
        Ok(Self {
            root: StorageRoot {
                path,
                is_fallback: false,
            },
        })
    }

    pub fn root(&self) -> &Path {
        &self.root.path
    }

    pub fn using_fallback(&self) -> bool {
        self.root.is_fallback
    }

    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.root.path.join(project)
    }

    fn project_file(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(PROJECT_FILE)
    }

    fn agents_file(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(AGENTS_FILE)
    }

    fn current_file(&self) -> PathBuf {
        self.root.path.join(CURRENT_FILE)
    }

    pub fn logs_dir(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(LOGS_DIR)
    }

    /// True when the project directory exists
    pub fn project_exists(&self, project: &str) -> bool {
        self.project_dir(project).is_dir()
    }

    /// Create the project directory, logs dir, metadata and empty agent list if absent.
    /// An existing project gets `update` merged in (and `updatedAt` bumped) when
    /// the update is non-empty. Safe to call repeatedly.
    pub fn ensure_project(&self, project: &str, update: &ProjectMetaUpdate) -> Result<EnsuredProject> {
        let dir = self.project_dir(project);
        let created = !dir.is_dir();
        let logs = self.logs_dir(project);
        fs::create_dir_all(&logs).map_err(|e| AppError::file_write(logs.display().to_string(), e))?;

        let now = Utc::now();
        let cwd = update.cwd.as_ref().map(|p| p.to_string_lossy().to_string());

        let meta = match self.load_project_meta(project) {
            Some(mut meta) => {
                if !update.is_empty() {
                    if cwd.is_some() {
                        meta.cwd = cwd;
                    }
                    meta.updated_at = now;
                    write_json(&self.project_file(project), &meta)?;
                }
                meta
            }
            None => {
                let meta = ProjectMeta {
                    name: project.to_string(),
                    cwd,
                    created_at: now,
                    updated_at: now,
                };
                write_json(&self.project_file(project), &meta)?;
                meta
            }
        };

        if !self.agents_file(project).exists() {
            write_json(&self.agents_file(project), &AgentsFile::empty(project))?;
        }

        debug!(project, created, "project ensured");
        Ok(EnsuredProject { created, meta })
    }

    pub fn load_project_meta(&self, project: &str) -> Option<ProjectMeta> {
        read_json(&self.project_file(project))
    }

    /// Project names derived from the directory listing, sorted
    pub fn list_project_names(&self) -> BTreeSet<String> {
        let entries = match fs::read_dir(&self.root.path) {
            Ok(entries) => entries,
            Err(_) => return BTreeSet::new(),
        };

        entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| name.len() <= MAX_NAME_LEN && RE_NAME.is_match(name))
            .collect()
    }

    /// Agent list for a project; empty when missing or unreadable
    pub fn load_agents(&self, project: &str) -> AgentsFile {
        match read_json::<AgentsFile>(&self.agents_file(project)) {
            Some(mut data) => {
                data.project = project.to_string();
                data
            }
            None => AgentsFile::empty(project),
        }
    }

    /// Full-replace write of the agent list; stamps `updatedAt`
    pub fn save_agents(&self, project: &str, data: &mut AgentsFile) -> Result<()> {
        data.project = project.to_string();
        data.updated_at = Utc::now();
        write_json(&self.agents_file(project), data)
    }

    pub fn agent_log_path(&self, project: &str, agent: &str) -> PathBuf {
        self.logs_dir(project).join(format!("{}.log", agent))
    }

    /// Create the log file if absent, never truncating an existing one
    pub fn ensure_agent_log(&self, project: &str, agent: &str) -> Result<PathBuf> {
        let path = self.agent_log_path(project, agent);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::file_write(parent.display().to_string(), e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AppError::file_write(path.display().to_string(), e))?;
        Ok(path)
    }

    pub fn current_project(&self) -> Option<String> {
        read_json::<CurrentProject>(&self.current_file()).map(|c| c.name)
    }

    pub fn set_current_project(&self, project: &str) -> Result<()> {
        let current = CurrentProject {
            name: project.to_string(),
            updated_at: Utc::now(),
        };
        write_json(&self.current_file(), &current)
    }

    pub fn clear_current_project(&self) -> Result<()> {
        match fs::remove_file(self.current_file()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::file_write(self.current_file().display().to_string(), e)),
        }
    }
}
