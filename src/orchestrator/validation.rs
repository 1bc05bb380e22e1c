use crate::constants::{MAX_NAME_LEN, RE_NAME};
use crate::error::{AppError, Result};

/// Validate a project or agent name.
/// `kind` names the thing being validated in the error message.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN || !RE_NAME.is_match(name) {
        return Err(AppError::invalid_name(kind, name));
    }
    Ok(())
}
