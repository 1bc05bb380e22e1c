use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{AppError, Result};

/// Storage root chosen once per process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot {
    pub path: PathBuf,
    pub is_fallback: bool,
}

/// Check that `dir` can be created and written to by dropping a scratch file in it
pub fn is_writable_dir(dir: &Path) -> bool {
    if fs::create_dir_all(dir).is_err() {
        return false;
    }

    let scratch = dir.join(format!(".write-check-{}", std::process::id()));
    let written = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&scratch)
        .and_then(|mut f| f.write_all(b"ok"))
        .is_ok();
    let _ = fs::remove_file(&scratch);
    written
}

/// Pick the storage root: `primary` when writable, otherwise `fallback`.
///
/// Call once at startup and keep the result; re-resolving per call could split
/// state across two roots.
pub fn resolve_storage_root(primary: &Path, fallback: &Path) -> Result<StorageRoot> {
    if is_writable_dir(primary) {
        return Ok(StorageRoot {
            path: primary.to_path_buf(),
            is_fallback: false,
        });
    }

    warn!(
        primary = %primary.display(),
        fallback = %fallback.display(),
        "primary storage root is not writable, using fallback"
    );

    if is_writable_dir(fallback) {
        return Ok(StorageRoot {
            path: fallback.to_path_buf(),
            is_fallback: true,
        });
    }

    Err(AppError::file_write(
        fallback.display().to_string(),
        format!(
            "neither {} nor {} is writable",
            primary.display(),
            fallback.display()
        ),
    ))
}

/// Make `path` absolute against `base` and resolve symlinks when it exists
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    joined.canonicalize().unwrap_or(joined)
}
