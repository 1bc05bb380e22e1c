use serde::Serialize;
use std::fmt;

/// Structured error type shared by the backend adapter, registry and orchestrator.
///
/// Serializes to `{ "code": "...", "message": "...", "details": "..." }` so a
/// caller exposing these operations can hand it back verbatim.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{code}: {message}{}", details_suffix(details))]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error codes for categorizing different error types
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    InvalidName,
    InvalidParams,
    UnsupportedAgentType,

    // Lookup errors
    NoCurrentProject,
    SessionNotFound,
    AgentAlreadyExists,
    AgentNotFound,
    WindowNotFound,

    // Tmux errors
    BackendCommandError,
    NoPaneFound,

    // File errors
    FileWriteError,
    ConfigError,

    // Generic
    Unknown,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

fn details_suffix(details: &Option<String>) -> String {
    details
        .as_ref()
        .map(|d| format!(" - {}", d))
        .unwrap_or_default()
}

impl AppError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn invalid_name(kind: &str, name: &str) -> Self {
        Self::new(
            ErrorCode::InvalidName,
            format!(
                "Invalid {} name '{}'. Must start with a letter or digit, contain only letters, digits, '.', '_' or '-', and be at most 128 characters.",
                kind, name
            ),
        )
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, msg)
    }

    pub fn unsupported_agent_type(agent_type: &str, allowed: &[&str]) -> Self {
        Self::new(
            ErrorCode::UnsupportedAgentType,
            format!("Unsupported agent type '{}'", agent_type),
        )
        .with_details(format!("Allowed types: {}", allowed.join(", ")))
    }

    pub fn no_current_project() -> Self {
        Self::new(
            ErrorCode::NoCurrentProject,
            "No current project. Create or switch to a project first.",
        )
    }

    pub fn session_not_found(session: impl Into<String>) -> Self {
        Self::new(ErrorCode::SessionNotFound, "Session not found").with_details(session)
    }

    pub fn agent_already_exists(project: &str, agent: &str) -> Self {
        Self::new(
            ErrorCode::AgentAlreadyExists,
            format!("Agent '{}' already exists in project '{}'", agent, project),
        )
    }

    pub fn agent_not_found(project: &str, agent: &str) -> Self {
        Self::new(
            ErrorCode::AgentNotFound,
            format!("Agent '{}' not found in project '{}'", agent, project),
        )
    }

    pub fn window_not_found(project: &str, window: &str) -> Self {
        Self::new(
            ErrorCode::WindowNotFound,
            format!("Window '{}' not found in project '{}'", window, project),
        )
    }

    /// A tmux invocation exited non-zero (or could not be started at all).
    pub fn backend_command(command: &str, status: Option<i32>, diagnostic: &str) -> Self {
        let status = status
            .map(|code| code.to_string())
            .unwrap_or_else(|| "signal".to_string());
        Self::new(
            ErrorCode::BackendCommandError,
            format!("tmux command failed (exit {}): {}", status, command),
        )
        .with_details(diagnostic.trim())
    }

    pub fn no_pane_found(window: &str) -> Self {
        Self::new(ErrorCode::NoPaneFound, "Window has no panes").with_details(window)
    }

    pub fn file_write(path: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::FileWriteError, format!("Failed to write {}", path.into()))
            .with_details(err.to_string())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, msg)
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, msg)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

// Conversions from common error types
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::unknown(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::unknown(format!("JSON serialization error: {}", err))
    }
}
