//! Closed set of agent programs that can be spawned

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Agent type (stored in agents.json and in the window's type tag)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Codex,
    Claude,
    Gemini,
    Opencode,
    Shell,
}

impl AgentType {
    pub const ALL: [AgentType; 5] = [
        AgentType::Codex,
        AgentType::Claude,
        AgentType::Gemini,
        AgentType::Opencode,
        AgentType::Shell,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Codex => "codex",
            AgentType::Claude => "claude",
            AgentType::Gemini => "gemini",
            AgentType::Opencode => "opencode",
            AgentType::Shell => "shell",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(AgentType::as_str).collect()
    }

    /// Built-in program and base arguments for this type
    pub fn default_command(&self) -> StartCommand {
        match self {
            AgentType::Shell => StartCommand::new("bash", ["--noprofile", "--norc"]),
            other => StartCommand::new(other.as_str(), Vec::<String>::new()),
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| AppError::unsupported_agent_type(s, &Self::names()))
    }
}

/// A program plus its argument list, run directly (no shell) as the window's program
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl StartCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}
