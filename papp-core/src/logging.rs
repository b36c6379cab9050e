//! Per-application log file.
//!
//! A [`LogContext`] is created explicitly by the launcher, owns the append-mode
//! log file, wires the `log` facade to it, and is shut down explicitly so
//! buffered lines reach the disk before the process exits.

use env_logger::{Target, WriteStyle};
use log::LevelFilter;
use papp_error::{PappError, PappResult};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Debug)]
pub struct LogContext {
    path: PathBuf,
    file: File,
}

impl LogContext {
    /// `<dir>/<app_id>.log`
    pub fn log_path(dir: &Path, app_id: &str) -> PathBuf {
        dir.join(format!("{}.log", app_id))
    }

    /// Create or open the log file for appending.
    pub fn open(dir: &Path, app_id: &str) -> PappResult<Self> {
        let path = Self::log_path(dir, app_id);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| PappError::LogFile {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying file, used as stdout/stderr sink for launched children.
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Route the `log` facade into this file.
    ///
    /// `level` is the global filter; per-module directives from `RUST_LOG`
    /// still apply. Only one logger can be installed per process; a second
    /// call fails with `LoggerInstalled`.
    pub fn install(&self, level: LevelFilter) -> PappResult<()> {
        let sink = self.file.try_clone().map_err(|source| PappError::LogFile {
            path: self.path.clone(),
            source,
        })?;

        env_logger::Builder::from_default_env()
            .target(Target::Pipe(Box::new(sink)))
            .write_style(WriteStyle::Never)
            .filter_level(level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{:<5} : {} {}: {}",
                    record.level(),
                    chrono::Local::now().format(TIMESTAMP_FORMAT),
                    record.target(),
                    record.args()
                )
            })
            .try_init()
            .map_err(|_| PappError::LoggerInstalled)
    }

    /// Flush pending log lines and sync the file to disk.
    pub fn shutdown(self) -> PappResult<()> {
        log::logger().flush();
        let mut file = self.file;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }
}
