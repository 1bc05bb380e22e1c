use std::path::Path;

use serde::Serialize;

use super::{session_target, Tmux};
use crate::constants::WINDOW_FORMAT;
use crate::error::{AppError, Result};

/// A window as reported by tmux
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    pub window_id: String,
    pub window_index: u32,
    pub window_name: String,
}

/// Parse one `WINDOW_FORMAT` line: `@3\t1\tname`
pub fn parse_window_line(line: &str) -> Option<WindowInfo> {
    let mut parts = line.splitn(3, '\t');
    let window_id = parts.next()?.trim();
    let window_index = parts.next()?.trim().parse::<u32>().ok()?;
    let window_name = parts.next().unwrap_or("").to_string();

    if !window_id.starts_with('@') {
        return None;
    }

    Some(WindowInfo {
        window_id: window_id.to_string(),
        window_index,
        window_name,
    })
}

impl Tmux {
    /// Create a detached window in `session`.
    /// When `command` is given it becomes the window's program, run with `args`.
    pub fn create_window(
        &self,
        session: &str,
        window_name: &str,
        cwd: Option<&Path>,
        command: Option<&str>,
        args: &[String],
    ) -> Result<WindowInfo> {
        let target = format!("{}:", session_target(session));
        let cwd = cwd.map(|p| p.to_string_lossy().to_string());

        let mut cmd_args: Vec<&str> = vec![
            "new-window", "-d", "-P", "-F", WINDOW_FORMAT, "-t", target.as_str(), "-n", window_name,
        ];
        if let Some(dir) = cwd.as_deref() {
            cmd_args.push("-c");
            cmd_args.push(dir);
        }
        if let Some(program) = command {
            cmd_args.push(program);
            cmd_args.extend(args.iter().map(String::as_str));
        }

        let stdout = self.check(&cmd_args)?;
        stdout
            .lines()
            .find_map(parse_window_line)
            .ok_or_else(|| {
                AppError::backend_command("new-window", Some(0), &format!("Unexpected reply: {:?}", stdout))
            })
    }

    /// List windows of a session
    pub fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>> {
        let target = session_target(session);
        let stdout = self.check(&["list-windows", "-t", &target, "-F", WINDOW_FORMAT])?;
        Ok(stdout.lines().filter_map(parse_window_line).collect())
    }

    /// Kill a window by target (normally its `@id`)
    pub fn kill_window(&self, target: &str) -> Result<()> {
        self.check(&["kill-window", "-t", target])?;
        Ok(())
    }

    /// Id (`%N`) of the first pane in a window
    pub fn first_pane_id(&self, window: &str) -> Result<String> {
        let stdout = self.check(&["list-panes", "-t", window, "-F", "#{pane_id}"])?;
        stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::no_pane_found(window))
    }

    /// Attach a user option (`@key`) to a window
    pub fn set_window_tag(&self, window: &str, key: &str, value: &str) -> Result<()> {
        self.check(&["set-option", "-w", "-t", window, key, value])?;
        Ok(())
    }

    /// Read a window user option; `None` when unset
    pub fn read_window_tag(&self, window: &str, key: &str) -> Result<Option<String>> {
        let output = self.exec(&["show-options", "-w", "-v", "-t", window, key])?;
        if !output.success {
            return Ok(None);
        }
        let value = output.stdout.trim_end_matches('\n').to_string();
        Ok(if value.is_empty() { None } else { Some(value) })
    }

    /// Every window of a session paired with the value of one user option
    /// (`None` when the window does not carry it)
    pub fn list_window_tags(&self, session: &str, key: &str) -> Result<Vec<(String, Option<String>)>> {
        let target = session_target(session);
        let format = format!("#{{window_id}}\t#{{{}}}", key);
        let stdout = self.check(&["list-windows", "-t", &target, "-F", &format])?;
        Ok(stdout
            .lines()
            .filter_map(|line| {
                let (id, value) = line.split_once('\t').unwrap_or((line, ""));
                let id = id.trim();
                if !id.starts_with('@') {
                    return None;
                }
                let value = (!value.is_empty()).then(|| value.to_string());
                Some((id.to_string(), value))
            })
            .collect())
    }
}
