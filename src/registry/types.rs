//! On-disk record shapes (camelCase JSON)

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AgentType;

/// `<root>/<project>/project.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub name: String,
    #[serde(default)]
    pub cwd: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields that may be merged into existing project metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectMetaUpdate {
    pub cwd: Option<PathBuf>,
}

impl ProjectMetaUpdate {
    pub fn is_empty(&self) -> bool {
        self.cwd.is_none()
    }
}

/// One spawned agent as recorded at spawn time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    pub project: String,
    /// Token written to the window's `@agentmux_id` tag at spawn
    #[serde(default)]
    pub instance_id: String,
    pub window_id: String,
    pub window_index: u32,
    #[serde(default)]
    pub window_name: String,
    #[serde(default)]
    pub pane_id: Option<String>,
    pub cwd: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub log_path: String,
    pub created_at: DateTime<Utc>,
}

/// `<root>/<project>/agents.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentsFile {
    pub project: String,
    #[serde(default)]
    pub agents: Vec<AgentEntry>,
    pub updated_at: DateTime<Utc>,
}

impl AgentsFile {
    pub fn empty(project: &str) -> Self {
        Self {
            project: project.to_string(),
            agents: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn find(&self, name: &str) -> Option<&AgentEntry> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Remove by name, returning the removed entry
    pub fn remove(&mut self, name: &str) -> Option<AgentEntry> {
        let pos = self.agents.iter().position(|a| a.name == name)?;
        Some(self.agents.remove(pos))
    }
}

/// `<root>/current.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentProject {
    pub name: String,
    pub updated_at: DateTime<Utc>,
}
