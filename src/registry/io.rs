//! Crash-safe JSON file helpers

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Atomically save data to a file using write-to-temp + rename.
/// Readers see either the old file or the new one, never a partial write.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| AppError::file_write(path.display().to_string(), "no parent directory"))?;
    fs::create_dir_all(parent)
        .map_err(|e| AppError::file_write(parent.display().to_string(), e))?;

    // Temp file in same directory to ensure same filesystem for rename
    let temp_path = parent.join(format!(
        ".{}.tmp.{}.{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown"),
        std::process::id(),
        Uuid::new_v4().simple()
    ));

    if let Err(e) = fs::write(&temp_path, contents) {
        let _ = fs::remove_file(&temp_path);
        return Err(AppError::file_write(temp_path.display().to_string(), e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        AppError::file_write(path.display().to_string(), e)
    })
}

/// Serialize as pretty JSON and write atomically
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    atomic_write(path, &bytes)
}

/// Read JSON, returning `None` for a missing or unreadable file.
/// Corruption is logged, not propagated.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read registry file");
            return None;
        }
    };

    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt registry file, ignoring");
            None
        }
    }
}
