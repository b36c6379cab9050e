//! Process execution types and trait.
//!
//! External commands must go through the HAL so registry and launch flows can
//! be tested without spawning real processes.

use crate::HalResult;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Description of a single child process invocation.
///
/// Built once with the consuming builder methods and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    hide_window: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            hide_window: false,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Working directory for the child only. An empty path means "inherit".
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.current_dir = if dir.as_os_str().is_empty() {
            None
        } else {
            Some(dir)
        };
        self
    }

    /// Suppress the console window of the child (Windows only).
    pub fn hide_window(mut self, hide: bool) -> Self {
        self.hide_window = hide;
        self
    }

    pub fn get_program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn hides_window(&self) -> bool {
        self.hide_window
    }

    /// Program and arguments joined by spaces, for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Outcome of a child process that has fully terminated.
///
/// The text accessors decode the captured bytes as UTF-8, replacing invalid
/// sequences with U+FFFD. Windows tools such as `reg.exe` write in the OEM
/// code page, so callers that need exact output read [`stdout_bytes`] and
/// [`stderr_bytes`], which hold the untrimmed capture.
///
/// [`stdout_bytes`]: CommandResult::stdout_bytes
/// [`stderr_bytes`]: CommandResult::stderr_bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    spec: CommandSpec,
    exit_code: i32,
    stdout: String,
    stderr: String,
    stdout_raw: Vec<u8>,
    stderr_raw: Vec<u8>,
}

impl CommandResult {
    /// Captured streams are stored whitespace-trimmed.
    pub fn new(spec: CommandSpec, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        Self::from_bytes(spec, exit_code, stdout.as_bytes(), stderr.as_bytes())
    }

    pub fn from_output(spec: CommandSpec, status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        Self::from_bytes(spec, exit_code(status), stdout, stderr)
    }

    fn from_bytes(spec: CommandSpec, exit_code: i32, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            spec,
            exit_code,
            stdout: String::from_utf8_lossy(stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
            stdout_raw: stdout.to_vec(),
            stderr_raw: stderr.to_vec(),
        }
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn stdout_bytes(&self) -> &[u8] {
        &self.stdout_raw
    }

    pub fn stderr_bytes(&self) -> &[u8] {
        &self.stderr_raw
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Numeric exit code of a terminated process.
///
/// On Unix a signal-terminated child has no code; it is reported as
/// `128 + signal` like a shell would.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Process execution trait (external command runner).
///
/// Both operations block the calling thread until the child exits. A child
/// that starts and exits non-zero is not an error.
pub trait ProcessOps {
    /// Run to completion with stdout and stderr captured in memory.
    fn run(&self, spec: CommandSpec) -> HalResult<CommandResult>;

    /// Run to completion with stdout and stderr appended to `sink`.
    fn run_redirected(&self, spec: &CommandSpec, sink: &File) -> HalResult<i32>;
}
