mod agent_type;

pub use agent_type::{AgentType, StartCommand};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DATA_DIR_NAME, DEFAULT_READ_LINES, DEFAULT_SEND_SETTLE_MS, DEFAULT_SOCKET_NAME,
    MAX_CONFIG_BYTES, MAX_READ_LINES,
};
use crate::error::{AppError, Result};

/// Per-type override of the start command
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentCommandConfig {
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

/// Runtime configuration (YAML file + environment overrides)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub tmux_binary: String,
    pub socket_name: String,
    /// Primary storage root; `<cwd>/.agentmux` when unset
    pub data_root: Option<PathBuf>,
    /// Used when the primary root is not writable; `<tmp>/agentmux-<user>` when unset
    pub fallback_root: Option<PathBuf>,
    pub send_settle_ms: u64,
    pub default_read_lines: usize,
    pub max_read_lines: usize,
    pub agents: BTreeMap<AgentType, AgentCommandConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmux_binary: "tmux".to_string(),
            socket_name: DEFAULT_SOCKET_NAME.to_string(),
            data_root: None,
            fallback_root: None,
            send_settle_ms: DEFAULT_SEND_SETTLE_MS,
            default_read_lines: DEFAULT_READ_LINES,
            max_read_lines: MAX_READ_LINES,
            agents: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from `AGENTMUX_CONFIG` (if set), then apply env overrides
    pub fn load() -> Result<Self> {
        match std::env::var("AGENTMUX_CONFIG") {
            Ok(path) => Self::load_from(Path::new(&path)),
            Err(_) => {
                let mut config = Self::default();
                config.apply_overrides(|key| std::env::var(key).ok())?;
                Ok(config)
            }
        }
    }

    /// Load a config file the user named explicitly, then apply env overrides.
    /// Unlike `from_file`, a missing file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let path = expand_home(path);
        if !path.is_file() {
            return Err(AppError::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a YAML file. A missing file yields defaults.
    ///
    /// Files over 1MB are rejected.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let metadata = fs::metadata(path)
            .map_err(|e| AppError::config(format!("Failed to read config metadata: {}", e)))?;
        if metadata.len() > MAX_CONFIG_BYTES {
            return Err(AppError::config(format!(
                "Config too large: {} bytes (max 1MB)",
                metadata.len()
            )));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read config: {}", e)))?;
        let config: Config = serde_yaml::from_str(&contents)
            .map_err(|e| AppError::config(format!("Failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `AGENTMUX_*` overrides; `lookup` is `std::env::var` outside tests
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AGENTMUX_TMUX") {
            self.tmux_binary = v;
        }
        if let Some(v) = lookup("AGENTMUX_SOCKET") {
            self.socket_name = v;
        }
        if let Some(v) = lookup("AGENTMUX_DATA_ROOT") {
            self.data_root = Some(expand_home(Path::new(&v)));
        }
        if let Some(v) = lookup("AGENTMUX_FALLBACK_ROOT") {
            self.fallback_root = Some(expand_home(Path::new(&v)));
        }
        if let Some(v) = lookup("AGENTMUX_SEND_SETTLE_MS") {
            self.send_settle_ms = v.trim().parse().map_err(|_| {
                AppError::config(format!("AGENTMUX_SEND_SETTLE_MS is not a number: {}", v))
            })?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.socket_name.trim().is_empty() {
            return Err(AppError::config("socket_name cannot be empty"));
        }
        if self.tmux_binary.trim().is_empty() {
            return Err(AppError::config("tmux_binary cannot be empty"));
        }
        if self.max_read_lines == 0 {
            return Err(AppError::config("max_read_lines must be positive"));
        }
        for (agent_type, cmd) in &self.agents {
            if matches!(cmd.program.as_deref(), Some(p) if p.trim().is_empty()) {
                return Err(AppError::config(format!(
                    "Empty program configured for agent type '{}'",
                    agent_type
                )));
            }
        }
        Ok(())
    }

    /// Primary storage root, resolved against `work_dir` when relative
    pub fn primary_root(&self, work_dir: &Path) -> PathBuf {
        match &self.data_root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => work_dir.join(root),
            None => work_dir.join(DATA_DIR_NAME),
        }
    }

    /// Fallback storage root outside the project tree
    pub fn fallback_root(&self) -> PathBuf {
        self.fallback_root.clone().unwrap_or_else(|| {
            let user = std::env::var("USER").unwrap_or_else(|_| "user".to_string());
            std::env::temp_dir().join(format!("agentmux-{}", user))
        })
    }

    /// Default start command for a type, with configured overrides applied
    pub fn start_command(&self, agent_type: AgentType) -> StartCommand {
        let mut command = agent_type.default_command();
        if let Some(custom) = self.agents.get(&agent_type) {
            if let Some(program) = &custom.program {
                command.program = program.clone();
            }
            if let Some(args) = &custom.args {
                command.args = args.clone();
            }
        }
        command
    }

    pub fn send_settle(&self) -> Duration {
        Duration::from_millis(self.send_settle_ms)
    }
}

/// Expand a leading `~/` (std::fs and Command never do)
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
