//! Command runner.
//!
//! Thin logging layer over [`ProcessOps::run`]: every invocation is logged as
//! an `Exec` line, blocks until the child exits, and never treats a non-zero
//! exit code as an error.

use papp_error::{PappError, PappResult};
use papp_hal::{CommandResult, CommandSpec, HalResult, ProcessOps};

/// Run `spec` to completion. Start-up failures become [`PappError::Launch`].
pub fn run<H: ProcessOps + ?Sized>(hal: &H, spec: CommandSpec) -> PappResult<CommandResult> {
    let program = spec.get_program().to_string();
    try_run(hal, spec).map_err(|source| PappError::launch(program, source))
}

/// Like [`run`] but keeps the HAL error so callers can wrap it themselves.
pub fn try_run<H: ProcessOps + ?Sized>(hal: &H, spec: CommandSpec) -> HalResult<CommandResult> {
    log::info!("Exec {}", spec.command_line());
    let result = hal.run(spec)?;
    log::debug!(
        "{} exited with code {}",
        result.spec().get_program(),
        result.exit_code()
    );
    Ok(result)
}

/// Log a non-zero exit and any captured error text. Returns whether the
/// command succeeded.
pub fn report_exit(result: &CommandResult) -> bool {
    if result.success() {
        return true;
    }
    log::error!(
        "{} exited with code {}",
        result.spec().command_line(),
        result.exit_code()
    );
    if !result.stderr().is_empty() {
        log::error!("{}", result.stderr());
    }
    false
}
