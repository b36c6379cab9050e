//! Fake HAL implementation for testing.
//!
//! This implementation records all operations without executing them,
//! allowing registry and launch flows to be tested on any host.

use super::{ClockOps, CommandResult, CommandSpec, ProcessOps};
use crate::{HalError, HalResult};
use chrono::{Duration, NaiveDateTime};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Command {
        program: String,
        args: Vec<String>,
        cwd: Option<PathBuf>,
        hide_window: bool,
    },
    Redirected {
        program: String,
        args: Vec<String>,
        cwd: Option<PathBuf>,
    },
}

impl Operation {
    fn from_spec(spec: &CommandSpec, redirected: bool) -> Self {
        let program = spec.get_program().to_string();
        let args = spec
            .get_args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let cwd = spec.get_current_dir().map(|d| d.to_path_buf());
        if redirected {
            Operation::Redirected { program, args, cwd }
        } else {
            Operation::Command {
                program,
                args,
                cwd,
                hide_window: spec.hides_window(),
            }
        }
    }

    pub fn program(&self) -> &str {
        match self {
            Operation::Command { program, .. } | Operation::Redirected { program, .. } => program,
        }
    }

    pub fn args(&self) -> &[String] {
        match self {
            Operation::Command { args, .. } | Operation::Redirected { args, .. } => args,
        }
    }

    /// Program and arguments joined by spaces.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program())
            .chain(self.args().iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Scripted outcome for a matching command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeResponse {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl FakeResponse {
    pub fn exit(code: i32) -> Self {
        Self {
            exit_code: code,
            ..Self::default()
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

#[derive(Clone)]
enum Script {
    Respond(FakeResponse),
    NotFound,
}

type Effect = Arc<dyn Fn(&CommandSpec) -> io::Result<()> + Send + Sync>;

/// Shared state for FakeHal operations.
#[derive(Default)]
struct FakeHalState {
    /// All operations that were recorded
    operations: Vec<Operation>,
    /// Scripted outcomes keyed by command-line prefix, first match wins
    scripts: Vec<(String, Script)>,
    /// Side effects keyed by command-line prefix, all matches run
    effects: Vec<(String, Effect)>,
    now: NaiveDateTime,
}

impl fmt::Debug for FakeHalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeHalState")
            .field("operations", &self.operations)
            .field("scripts", &self.scripts.len())
            .field("effects", &self.effects.len())
            .field("now", &self.now)
            .finish()
    }
}

/// Fake HAL implementation that records operations without executing them.
///
/// Unscripted commands succeed with exit code 0 and empty output. The clock
/// stands still until moved with [`FakeHal::set_now`] or [`FakeHal::advance`].
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeHalState> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state().operations.clone()
    }

    /// Get the number of operations recorded.
    pub fn operation_count(&self) -> usize {
        self.state().operations.len()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.state().operations.iter().any(check)
    }

    /// Clear all recorded operations. Scripts and effects are kept.
    pub fn clear(&self) {
        self.state().operations.clear();
    }

    /// Answer commands whose command line starts with `prefix`.
    pub fn respond(&self, prefix: impl Into<String>, response: FakeResponse) {
        self.state()
            .scripts
            .push((prefix.into(), Script::Respond(response)));
    }

    /// Make commands starting with `prefix` fail as if the program were missing.
    pub fn not_found(&self, prefix: impl Into<String>) {
        self.state().scripts.push((prefix.into(), Script::NotFound));
    }

    /// Run `effect` whenever a command starting with `prefix` succeeds in starting.
    pub fn on_command<F>(&self, prefix: impl Into<String>, effect: F)
    where
        F: Fn(&CommandSpec) -> io::Result<()> + Send + Sync + 'static,
    {
        self.state().effects.push((prefix.into(), Arc::new(effect)));
    }

    pub fn set_now(&self, now: NaiveDateTime) {
        self.state().now = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut state = self.state();
        state.now += by;
    }

    fn record_operation(&self, op: Operation) {
        self.state().operations.push(op);
    }

    fn dispatch(&self, spec: &CommandSpec, redirected: bool) -> HalResult<FakeResponse> {
        self.record_operation(Operation::from_spec(spec, redirected));

        let line = spec.command_line();
        let (script, effects) = {
            let state = self.state();
            let script = state
                .scripts
                .iter()
                .find(|(prefix, _)| line.starts_with(prefix.as_str()))
                .map(|(_, s)| s.clone());
            let effects: Vec<Effect> = state
                .effects
                .iter()
                .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
                .map(|(_, e)| Arc::clone(e))
                .collect();
            (script, effects)
        };

        let response = match script {
            Some(Script::NotFound) => {
                log::info!("FAKE HAL: {} not found", spec.get_program());
                return Err(HalError::CommandNotFound(spec.get_program().to_string()));
            }
            Some(Script::Respond(response)) => response,
            None => FakeResponse::default(),
        };

        for effect in effects {
            effect(spec)?;
        }

        log::info!("FAKE HAL: {} (exit={})", line, response.exit_code);
        Ok(response)
    }
}

impl ProcessOps for FakeHal {
    fn run(&self, spec: CommandSpec) -> HalResult<CommandResult> {
        let response = self.dispatch(&spec, false)?;
        Ok(CommandResult::new(
            spec,
            response.exit_code,
            &response.stdout,
            &response.stderr,
        ))
    }

    fn run_redirected(&self, spec: &CommandSpec, _sink: &File) -> HalResult<i32> {
        Ok(self.dispatch(spec, true)?.exit_code)
    }
}

impl ClockOps for FakeHal {
    fn now_local(&self) -> NaiveDateTime {
        self.state().now
    }
}
