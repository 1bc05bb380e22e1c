//! agentmux command line
//!
//! Thin collaborator over the orchestrator: one subcommand per operation,
//! results printed to stdout as JSON. Logs go to stderr.
//!
//! Usage:
//!   agentmux create-project demo --cwd /tmp/x
//!   agentmux spawn shell a1 -- -x
//!   agentmux send a1 "echo hi"
//!   agentmux read a1 -n 50
//!
//! Environment variables:
//!   - AGENTMUX_CONFIG: YAML config file
//!   - AGENTMUX_TMUX / AGENTMUX_SOCKET: tmux binary and private socket name
//!   - AGENTMUX_DATA_ROOT / AGENTMUX_FALLBACK_ROOT: registry roots
//!   - RUST_LOG: log filter (default: info)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use agentmux::{Config, Orchestrator, SpawnOptions};

#[derive(Parser)]
#[command(name = "agentmux")]
#[command(about = "Run interactive agents as windows of a private tmux server")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to $AGENTMUX_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a project (tmux session + registry) and make it current
    CreateProject {
        name: String,
        /// Working directory for the session and its agents
        #[arg(long)]
        cwd: Option<PathBuf>,
    },

    /// List projects known to the registry or running in tmux
    ListProjects,

    /// Make a project current and move attached clients to it
    SwitchProject { name: String },

    /// Kill a project's session; registry files are kept
    CloseProject { name: String },

    /// Report (and optionally kill) tagged windows missing from the registry
    Reconcile {
        #[arg(long)]
        project: Option<String>,
        /// Kill the orphan windows found
        #[arg(long)]
        kill: bool,
    },

    /// Print the current project
    Current,

    /// Spawn an agent window in the current project
    Spawn {
        /// codex, claude, gemini, opencode or shell
        agent_type: String,
        name: String,
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// Replacement program (and base args) for the agent type
        #[arg(long)]
        command: Option<String>,
        /// Extra arguments appended after the base args
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// List agents with their liveness
    ListAgents {
        #[arg(long)]
        project: Option<String>,
    },

    /// Select an agent's window and point clients at it
    Attach { name: String },

    /// Send Ctrl-C to an agent
    Interrupt { name: String },

    /// Kill an agent's window and remove it from the registry
    Kill { name: String },

    /// Type text into an agent and press Enter
    Send { name: String, text: String },

    /// Type text into a window (name, @id or index) and press Enter
    SendWindow { window: String, text: String },

    /// Print recent non-blank lines of an agent's pane
    Read {
        name: String,
        #[arg(short = 'n', long)]
        lines: Option<usize>,
    },
}

fn load_config(path: Option<PathBuf>) -> agentmux::Result<Config> {
    match path {
        Some(path) => Config::load_from(&path),
        None => Config::load(),
    }
}

fn dispatch(orch: &Orchestrator, command: Commands) -> agentmux::Result<Value> {
    let value = match command {
        Commands::CreateProject { name, cwd } => {
            serde_json::to_value(orch.create_project(&name, cwd.as_deref())?)?
        }
        Commands::ListProjects => json!({ "projects": orch.list_projects()? }),
        Commands::SwitchProject { name } => serde_json::to_value(orch.switch_project(&name)?)?,
        Commands::CloseProject { name } => serde_json::to_value(orch.close_project(&name)?)?,
        Commands::Reconcile { project, kill } => {
            serde_json::to_value(orch.reconcile_project(project.as_deref(), kill)?)?
        }
        Commands::Current => json!({ "project": orch.current_project() }),
        Commands::Spawn {
            agent_type,
            name,
            cwd,
            command,
            args,
        } => {
            let options = SpawnOptions { cwd, command, args };
            serde_json::to_value(orch.spawn_agent(&agent_type, &name, &options)?)?
        }
        Commands::ListAgents { project } => {
            serde_json::to_value(orch.list_agents(project.as_deref())?)?
        }
        Commands::Attach { name } => serde_json::to_value(orch.attach_agent(&name)?)?,
        Commands::Interrupt { name } => serde_json::to_value(orch.interrupt_agent(&name)?)?,
        Commands::Kill { name } => serde_json::to_value(orch.kill_agent(&name)?)?,
        Commands::Send { name, text } => serde_json::to_value(orch.send_to_agent(&name, &text)?)?,
        Commands::SendWindow { window, text } => {
            serde_json::to_value(orch.send_to_window(&window, &text)?)?
        }
        Commands::Read { name, lines } => {
            serde_json::to_value(orch.read_agent_output(&name, lines)?)?
        }
    };
    Ok(value)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging (stderr, stdout is reserved for JSON)
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config).context("Failed to load configuration")?;
    let orch = Orchestrator::from_config(config).context("Failed to open registry")?;

    match dispatch(&orch, cli.command) {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&json!({ "error": e }))?);
            std::process::exit(1);
        }
    }
}
