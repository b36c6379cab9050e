//! HAL implementation backed by real processes and the system clock.

use super::process_ops::exit_code;
use super::{ClockOps, CommandResult, CommandSpec, ProcessOps};
use crate::{HalError, HalResult};
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread::JoinHandle;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Real HAL implementation.
#[derive(Debug, Clone, Default)]
pub struct NativeHal;

impl NativeHal {
    pub fn new() -> Self {
        Self
    }
}

fn map_spawn_err(spec: &CommandSpec, err: io::Error) -> HalError {
    let program = spec.get_program().to_string();
    // A missing working directory also surfaces as NotFound.
    let cwd_ok = spec.get_current_dir().map_or(true, |dir| dir.is_dir());
    if err.kind() == io::ErrorKind::NotFound && cwd_ok {
        return HalError::CommandNotFound(program);
    }
    HalError::Spawn {
        program,
        source: err,
    }
}

#[cfg(windows)]
fn hide_console(cmd: &mut Command) -> HalResult<()> {
    use std::os::windows::process::CommandExt;
    cmd.creation_flags(CREATE_NO_WINDOW);
    Ok(())
}

#[cfg(not(windows))]
fn hide_console(_cmd: &mut Command) -> HalResult<()> {
    Err(HalError::Unsupported(
        "hiding the console window requires Windows".to_string(),
    ))
}

fn build_command(spec: &CommandSpec) -> HalResult<Command> {
    let mut cmd = Command::new(spec.get_program());
    cmd.args(spec.get_args()).stdin(Stdio::null());
    if let Some(dir) = spec.get_current_dir() {
        cmd.current_dir(dir);
    }
    if spec.hides_window() {
        hide_console(&mut cmd)?;
    }
    Ok(cmd)
}

/// Read a pipe to its end. A missing pipe reads as empty.
fn drain<R: Read>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

fn join_drain(handle: JoinHandle<io::Result<Vec<u8>>>, stream: &str) -> HalResult<Vec<u8>> {
    match handle.join() {
        Ok(read) => Ok(read?),
        Err(_) => Err(HalError::Other(format!("{} reader thread panicked", stream))),
    }
}

impl ProcessOps for NativeHal {
    fn run(&self, spec: CommandSpec) -> HalResult<CommandResult> {
        let mut cmd = build_command(&spec)?;
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        let mut child = cmd.spawn().map_err(|e| map_spawn_err(&spec, e))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Drain pipes concurrently to avoid deadlocks on large output.
        let stdout_handle = std::thread::spawn(move || drain(stdout));
        let stderr_handle = std::thread::spawn(move || drain(stderr));

        let status = child.wait()?;

        let stdout = join_drain(stdout_handle, "stdout")?;
        let stderr = join_drain(stderr_handle, "stderr")?;
        Ok(CommandResult::from_output(spec, status, &stdout, &stderr))
    }

    fn run_redirected(&self, spec: &CommandSpec, sink: &File) -> HalResult<i32> {
        let mut cmd = build_command(spec)?;
        cmd.stdout(Stdio::from(sink.try_clone()?))
            .stderr(Stdio::from(sink.try_clone()?));
        let mut child = cmd.spawn().map_err(|e| map_spawn_err(spec, e))?;
        let status = child.wait()?;
        Ok(exit_code(status))
    }
}

impl ClockOps for NativeHal {
    fn now_local(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}
