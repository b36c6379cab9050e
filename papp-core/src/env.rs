use papp_error::{PappError, PappResult};

/// Set a process-wide environment variable inherited by every child started
/// afterwards.
pub fn override_env(key: &str, value: &str) -> PappResult<()> {
    let reason = if key.is_empty() {
        Some("empty name")
    } else if key.contains('=') {
        Some("name contains '='")
    } else if key.contains('\0') || value.contains('\0') {
        Some("contains a NUL character")
    } else {
        None
    };
    if let Some(reason) = reason {
        return Err(PappError::EnvOverride {
            key: key.to_string(),
            reason: reason.to_string(),
        });
    }

    log::info!("Override env {}={}", key, value);
    std::env::set_var(key, value);
    Ok(())
}
