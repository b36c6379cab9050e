//! Portable application bootstrap and launch.

use crate::logging::LogContext;
use log::LevelFilter;
use papp_error::{PappError, PappResult};
use papp_hal::path::path_join;
use papp_hal::{CommandSpec, ProcessOps};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Identity of the launcher, fixed at build time by each portable app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PappSettings {
    /// Short identifier; names the log file.
    pub id: String,
    /// Human readable name used in log lines.
    pub name: String,
    pub log_level: LevelFilter,
}

impl PappSettings {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            log_level: LevelFilter::Info,
        }
    }

    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }
}

/// A portable application: where the launcher lives and what it starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Papp {
    pub id: String,
    pub name: String,
    /// Directory containing the launcher executable.
    pub path: PathBuf,
    /// Directory of the bundled application, `<path>/app` unless changed.
    pub app_path: PathBuf,
    /// Directory holding portable data, `<path>/data`.
    pub data_path: PathBuf,
    pub process: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

/// Directory of the running executable.
pub fn exe_dir() -> PappResult<PathBuf> {
    let exe = std::env::current_exe().map_err(PappError::CurrentPath)?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        PappError::CurrentPath(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} has no parent directory", exe.display()),
        ))
    })
}

impl Papp {
    /// Bootstrap from the directory of the running executable.
    pub fn init(settings: PappSettings) -> PappResult<(Self, LogContext)> {
        Self::init_in(exe_dir()?, settings)
    }

    /// Bootstrap rooted at `path`: open `<path>/<id>.log`, install logging,
    /// and write the start banner.
    pub fn init_in(path: PathBuf, settings: PappSettings) -> PappResult<(Self, LogContext)> {
        let log = LogContext::open(&path, &settings.id)?;
        match log.install(settings.log_level) {
            Ok(()) => {}
            Err(PappError::LoggerInstalled) => {
                log::warn!("Logger already installed, keeping it");
            }
            Err(err) => return Err(err),
        }

        let papp = Papp {
            id: settings.id,
            name: settings.name,
            app_path: path.join("app"),
            data_path: path.join("data"),
            path,
            ..Papp::default()
        };

        log::info!("--------");
        log::info!("Starting {}...", papp.name);
        log::info!("Current path: {}", papp.path.display());
        Ok((papp, log))
    }

    /// `path_join` rooted at the launcher directory.
    pub fn app_path_join(&self, elems: &[&str]) -> String {
        let root = self.path.to_string_lossy();
        let mut all: Vec<&str> = Vec::with_capacity(elems.len() + 1);
        all.push(&root);
        all.extend_from_slice(elems);
        path_join(&all)
    }

    /// Start the configured process with its output appended to the log file
    /// and wait for it to exit.
    pub fn launch<H: ProcessOps + ?Sized>(&self, hal: &H, log: &LogContext) -> PappResult<i32> {
        let working_dir = self
            .working_dir
            .as_deref()
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        log::info!("Process: {}", self.process);
        log::info!("Args: {}", self.args.join(" "));
        log::info!("Working dir: {}", working_dir);
        log::info!("Data path: {}", self.data_path.display());

        log::info!("Launch {}...", self.name);
        let mut spec = CommandSpec::new(self.process.as_str()).args(&self.args);
        if let Some(dir) = &self.working_dir {
            spec = spec.current_dir(dir);
        }

        log::info!("Exec {}", spec.command_line());
        let code = hal
            .run_redirected(&spec, log.file())
            .map_err(|source| PappError::launch(self.process.as_str(), source))?;
        log::info!("{} exited with code {}", self.name, code);
        Ok(code)
    }
}

/// Create `path` and its parents, open to every user on Unix.
pub fn create_folder(path: impl AsRef<Path>) -> PappResult<PathBuf> {
    let path = path.as_ref();
    log::info!("Create folder {}...", path.display());
    create_dir_all_open(path).map_err(|source| PappError::CreateFolder {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(path.to_path_buf())
}

#[cfg(unix)]
fn create_dir_all_open(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o777).create(path)
}

#[cfg(not(unix))]
fn create_dir_all_open(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Name of the first directory in `source` whose name starts with `prefix`.
///
/// Entries are checked in name order, so versioned folders such as
/// `app-1.2.0` and `app-1.3.0` resolve deterministically.
pub fn find_electron_app_folder(prefix: &str, source: impl AsRef<Path>) -> PappResult<String> {
    let source = source.as_ref();
    log::info!("Lookup app folder in: {}", source.display());

    let not_found = || PappError::ElectronFolderNotFound {
        prefix: prefix.to_string(),
        dir: source.to_path_buf(),
    };

    let entries = match fs::read_dir(source) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("Cannot read {}: {}", source.display(), err);
            return Err(not_found());
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    match names.into_iter().find(|name| name.starts_with(prefix)) {
        Some(name) => {
            log::info!("Electron app folder found: {}", name);
            Ok(name)
        }
        None => Err(not_found()),
    }
}
