use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type HalResult<T> = Result<T, HalError>;
pub type PappResult<T> = Result<T, PappError>;

/// Failures raised while talking to the operating system.
#[derive(Error, Debug)]
pub enum HalError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Cannot spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported platform: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum PappError {
    #[error("Command failed to start: {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: HalError,
    },

    #[error("Cannot export registry key '{key}': {source}")]
    Export {
        key: String,
        #[source]
        source: HalError,
    },

    #[error("Cannot import registry file '{}': {source}", file.display())]
    Import {
        file: PathBuf,
        #[source]
        source: HalError,
    },

    #[error("Current path: {0}")]
    CurrentPath(#[source] io::Error),

    #[error("Log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Logger already installed")]
    LoggerInstalled,

    #[error("Cannot create folder {}: {source}", path.display())]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot set {key} env var: {reason}")]
    EnvOverride { key: String, reason: String },

    #[error("Electron main path does not exist with prefix '{prefix}' in {}", dir.display())]
    ElectronFolderNotFound { prefix: String, dir: PathBuf },

    #[error("Invalid registry architecture view: {0} (expected 32 or 64)")]
    InvalidArch(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PappError {
    /// Wraps a HAL failure raised while starting `program`.
    pub fn launch(program: impl Into<String>, source: HalError) -> Self {
        Self::Launch {
            program: program.into(),
            source,
        }
    }
}
