//! Terminal input handling
//!
//! Delivers text and named keys to a pane.

use tracing::warn;

use super::Tmux;
use crate::error::{AppError, Result};

/// Translate a friendly key name to its tmux key name.
///
/// Supported keys:
/// - "Enter" → "Enter"
/// - "Backspace" → "BSpace"
/// - "Tab" → "Tab"
/// - "ArrowUp"/"ArrowDown"/"ArrowLeft"/"ArrowRight" → "Up"/"Down"/"Left"/"Right"
/// - "Escape" → "Escape"
/// - "Delete" → "DC" (Delete Character)
/// - "Home"/"End" → "Home"/"End"
/// - "PageUp"/"PageDown" → "PPage"/"NPage"
/// - "C-c" → "C-c"
pub fn tmux_key_name(key: &str) -> Result<&'static str> {
    let name = match key {
        "Enter" => "Enter",
        "Backspace" => "BSpace",
        "Tab" => "Tab",
        "ArrowUp" => "Up",
        "ArrowDown" => "Down",
        "ArrowLeft" => "Left",
        "ArrowRight" => "Right",
        "Escape" => "Escape",
        "Delete" => "DC",
        "Home" => "Home",
        "End" => "End",
        "PageUp" => "PPage",
        "PageDown" => "NPage",
        "C-c" => "C-c",
        _ => return Err(AppError::invalid_params(format!("Unsupported key: {}", key))),
    };
    Ok(name)
}

impl Tmux {
    /// Leave copy mode if the pane is in it, otherwise input lands in the scroll buffer.
    /// Best effort: failures are logged, never returned.
    pub fn exit_copy_mode_if_needed(&self, pane: &str) {
        let in_mode = match self.exec(&["display-message", "-p", "-t", pane, "#{pane_in_mode}"]) {
            Ok(output) if output.success => output.stdout.trim() == "1",
            Ok(output) => {
                warn!(pane, diagnostic = %output.diagnostic(), "could not query pane mode");
                false
            }
            Err(e) => {
                warn!(pane, error = %e, "could not query pane mode");
                false
            }
        };

        if in_mode {
            if let Err(e) = self.check(&["send-keys", "-t", pane, "-X", "cancel"]) {
                warn!(pane, error = %e, "failed to leave copy mode");
            }
        }
    }

    /// Send text without key-binding interpretation (`send-keys -l`)
    pub fn send_literal_keys(&self, pane: &str, text: &str) -> Result<()> {
        self.check(&["send-keys", "-t", pane, "-l", "--", text])?;
        Ok(())
    }

    /// Send one named key (see `tmux_key_name`)
    pub fn send_key(&self, pane: &str, key: &str) -> Result<()> {
        let key = tmux_key_name(key)?;
        self.check(&["send-keys", "-t", pane, key])?;
        Ok(())
    }
}
