use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of a project or agent name
pub const MAX_NAME_LEN: usize = 128;

/// Project and agent names: alphanumeric start, then alphanumerics, '.', '_' or '-'.
/// Length is checked separately against MAX_NAME_LEN.
pub static RE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("Invalid regex pattern for names")
});

/// Default private tmux socket (`tmux -L <name>`), keeps us off the operator's server
pub const DEFAULT_SOCKET_NAME: &str = "agentmux";

/// Name of the primary storage directory created under the working directory
pub const DATA_DIR_NAME: &str = ".agentmux";

/// Registry file names
pub const PROJECT_FILE: &str = "project.json";
pub const AGENTS_FILE: &str = "agents.json";
pub const CURRENT_FILE: &str = "current.json";
pub const LOGS_DIR: &str = "logs";

/// Window user options recording the logical agent identity
pub const TAG_AGENT_NAME: &str = "@agentmux_name";
pub const TAG_AGENT_TYPE: &str = "@agentmux_type";

/// Per-spawn instance token; window ids restart from @0 with every new server
pub const TAG_AGENT_ID: &str = "@agentmux_id";

/// Delay between literal text and the Enter key
pub const DEFAULT_SEND_SETTLE_MS: u64 = 100;

/// Lines returned by read_agent_output when the caller doesn't ask for a count
pub const DEFAULT_READ_LINES: usize = 200;
pub const MAX_READ_LINES: usize = 5000;

/// Config file size cap (1MB)
pub const MAX_CONFIG_BYTES: u64 = 1_048_576;

/// Format used for every tmux window listing: id, index, name
pub const WINDOW_FORMAT: &str = "#{window_id}\t#{window_index}\t#{window_name}";
