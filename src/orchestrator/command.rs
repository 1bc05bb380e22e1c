//! Start-command resolution for spawned agents

use crate::config::StartCommand;
use crate::error::{AppError, Result};

/// Resolve the program a new agent window runs.
///
/// `override_cmd` replaces the type's default program: its first word is the
/// program and the remaining words are its base arguments. `extra_args` are
/// always appended after the base arguments (default or override), never
/// replacing them.
pub fn resolve_start_command(
    default: &StartCommand,
    override_cmd: Option<&str>,
    extra_args: &[String],
) -> Result<StartCommand> {
    let mut command = match override_cmd {
        Some(raw) => {
            let mut words = raw.split_whitespace().map(str::to_string);
            let program = words
                .next()
                .ok_or_else(|| AppError::invalid_params("Command override cannot be empty"))?;
            StartCommand {
                program,
                args: words.collect(),
            }
        }
        None => default.clone(),
    };

    command.args.extend(extra_args.iter().cloned());
    Ok(command)
}
