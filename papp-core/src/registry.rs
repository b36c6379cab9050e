//! Registry backup and restore through `reg.exe`.
//!
//! Keys are exported to and imported from `.reg` files with the command-line
//! tool rather than the native registry API. A non-zero exit from `reg` is a
//! soft failure: it is logged and reported, never returned as an error.

use crate::runner;
use chrono::NaiveDateTime;
use papp_error::{PappError, PappResult};
use papp_hal::{CommandSpec, SystemHal};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const REG: &str = "reg";

/// Sortable local timestamp appended to backup files.
const BACKUP_STAMP: &str = "%Y%m%d%H%M%S";

/// Registry architecture view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegArch {
    X32,
    X64,
}

impl RegArch {
    pub fn token(&self) -> &'static str {
        match self {
            RegArch::X32 => "32",
            RegArch::X64 => "64",
        }
    }

    /// The `/reg:NN` switch understood by `reg export` and `reg import`.
    pub fn switch(&self) -> String {
        format!("/reg:{}", self.token())
    }
}

impl fmt::Display for RegArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for RegArch {
    type Err = PappError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "32" | "x86" => Ok(RegArch::X32),
            "64" | "x64" => Ok(RegArch::X64),
            other => Err(PappError::InvalidArch(other.to_string())),
        }
    }
}

/// A key, its architecture view, and the `.reg` file it moves through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryTransfer {
    pub key: String,
    pub arch: RegArch,
    pub file: PathBuf,
}

impl RegistryTransfer {
    pub fn new(key: impl Into<String>, arch: RegArch, file: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            arch,
            file: file.into(),
        }
    }

    fn export_spec(&self) -> CommandSpec {
        CommandSpec::new(REG)
            .arg("export")
            .arg(&self.key)
            .arg(&self.file)
            .arg("/y")
            .arg(self.arch.switch())
            .hide_window(true)
    }

    fn import_spec(&self) -> CommandSpec {
        CommandSpec::new(REG)
            .arg("import")
            .arg(&self.file)
            .arg(self.arch.switch())
            .hide_window(true)
    }
}

/// How a single `reg` step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegStatus {
    Completed,
    /// `reg` ran but exited non-zero.
    SoftFailure { exit_code: i32, stderr: String },
    /// Nothing to import.
    Skipped,
}

impl RegStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RegStatus::Completed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Where the pre-import snapshot was written.
    pub backup: PathBuf,
    pub backup_status: RegStatus,
    pub import_status: RegStatus,
}

/// `<file>.<YYYYMMDDhhmmss>`
pub fn backup_path(file: &Path, now: NaiveDateTime) -> PathBuf {
    let mut name = OsString::from(file.as_os_str());
    name.push(".");
    name.push(now.format(BACKUP_STAMP).to_string());
    PathBuf::from(name)
}

fn with_counter(base: &Path, n: u32) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!("-{:02}", n));
    PathBuf::from(name)
}

/// Registry export/import bound to a HAL.
///
/// The instance remembers the backup names it handed out, so two imports in
/// the same second still get distinct snapshots. Callers must serialize
/// operations on the same key; nothing here locks the registry.
pub struct Registry<'a, H: SystemHal + ?Sized> {
    hal: &'a H,
    issued: HashSet<PathBuf>,
}

impl<'a, H: SystemHal + ?Sized> Registry<'a, H> {
    pub fn new(hal: &'a H) -> Self {
        Self {
            hal,
            issued: HashSet::new(),
        }
    }

    /// `reg export <key> <file> /y /reg:<arch>`, overwriting `file`.
    pub fn export_key(&self, transfer: &RegistryTransfer) -> PappResult<RegStatus> {
        let result = runner::try_run(self.hal, transfer.export_spec()).map_err(|source| {
            PappError::Export {
                key: transfer.key.clone(),
                source,
            }
        })?;
        if runner::report_exit(&result) {
            return Ok(RegStatus::Completed);
        }
        Ok(RegStatus::SoftFailure {
            exit_code: result.exit_code(),
            stderr: result.stderr().to_string(),
        })
    }

    /// Snapshot the key next to `transfer.file`, then import `transfer.file`.
    ///
    /// A missing or unreadable import file skips the import step.
    pub fn import_key_with_backup(&mut self, transfer: &RegistryTransfer) -> PappResult<ImportReport> {
        let backup = self.next_backup_path(&transfer.file);
        let backup_status = self.export_key(&RegistryTransfer {
            key: transfer.key.clone(),
            arch: transfer.arch,
            file: backup.clone(),
        })?;

        if let Err(err) = std::fs::metadata(&transfer.file) {
            log::info!(
                "No registry file to import at {} ({})",
                transfer.file.display(),
                err
            );
            return Ok(ImportReport {
                backup,
                backup_status,
                import_status: RegStatus::Skipped,
            });
        }

        let result = runner::try_run(self.hal, transfer.import_spec()).map_err(|source| {
            PappError::Import {
                file: transfer.file.clone(),
                source,
            }
        })?;
        let import_status = if runner::report_exit(&result) {
            RegStatus::Completed
        } else {
            RegStatus::SoftFailure {
                exit_code: result.exit_code(),
                stderr: result.stderr().to_string(),
            }
        };

        Ok(ImportReport {
            backup,
            backup_status,
            import_status,
        })
    }

    fn next_backup_path(&mut self, file: &Path) -> PathBuf {
        let base = backup_path(file, self.hal.now_local());
        let mut candidate = base.clone();
        let mut n = 0;
        while self.issued.contains(&candidate) || candidate.exists() {
            n += 1;
            candidate = with_counter(&base, n);
        }
        self.issued.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use papp_hal::{FakeHal, FakeResponse, Operation};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn arch_parses_tokens() {
        assert_eq!("64".parse::<RegArch>().unwrap(), RegArch::X64);
        assert_eq!(" x86 ".parse::<RegArch>().unwrap(), RegArch::X32);
        assert!(matches!(
            "128".parse::<RegArch>().unwrap_err(),
            PappError::InvalidArch(ref t) if t == "128"
        ));
        assert_eq!(RegArch::X32.switch(), "/reg:32");
    }

    #[test]
    fn backup_path_appends_sortable_stamp() {
        let path = backup_path(Path::new(r"C:\data\foo.reg"), at(7, 5, 3));
        assert_eq!(path, PathBuf::from(r"C:\data\foo.reg.20240309070503"));
    }

    #[test]
    fn export_builds_reg_export_command() {
        let hal = FakeHal::new();
        let registry = Registry::new(&hal);
        let transfer = RegistryTransfer::new(r"HKCU\Software\Foo", RegArch::X64, r"C:\backup\foo.reg");

        let status = registry.export_key(&transfer).unwrap();

        assert_eq!(status, RegStatus::Completed);
        assert_eq!(
            hal.operations(),
            vec![Operation::Command {
                program: "reg".into(),
                args: vec![
                    "export".into(),
                    r"HKCU\Software\Foo".into(),
                    r"C:\backup\foo.reg".into(),
                    "/y".into(),
                    "/reg:64".into(),
                ],
                cwd: None,
                hide_window: true,
            }]
        );
    }

    #[test]
    fn export_nonzero_exit_is_soft_failure() {
        let hal = FakeHal::new();
        hal.respond("reg export", FakeResponse::exit(1).with_stderr("ERROR: key not found\n"));
        let registry = Registry::new(&hal);

        let status = registry
            .export_key(&RegistryTransfer::new(r"HKCU\Missing", RegArch::X32, "out.reg"))
            .unwrap();

        assert_eq!(
            status,
            RegStatus::SoftFailure {
                exit_code: 1,
                stderr: "ERROR: key not found".into()
            }
        );
    }

    #[test]
    fn export_start_failure_is_export_error() {
        let hal = FakeHal::new();
        hal.not_found("reg");
        let registry = Registry::new(&hal);

        let err = registry
            .export_key(&RegistryTransfer::new(r"HKCU\Foo", RegArch::X64, "out.reg"))
            .unwrap_err();

        assert!(matches!(err, PappError::Export { ref key, .. } if key == r"HKCU\Foo"));
    }

    #[test]
    fn import_without_file_only_backs_up() {
        let tmp = tempfile::tempdir().unwrap();
        let hal = FakeHal::new();
        hal.set_now(at(10, 0, 0));
        let mut registry = Registry::new(&hal);
        let file = tmp.path().join("absent.reg");

        let report = registry
            .import_key_with_backup(&RegistryTransfer::new(r"HKCU\Foo", RegArch::X64, &file))
            .unwrap();

        assert_eq!(report.import_status, RegStatus::Skipped);
        assert_eq!(report.backup, backup_path(&file, at(10, 0, 0)));
        assert_eq!(hal.operation_count(), 1);
        assert!(!hal.has_operation(|op| op.args().first().map(String::as_str) == Some("import")));
    }

    #[test]
    fn backup_names_skip_files_already_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let hal = FakeHal::new();
        hal.set_now(at(10, 0, 0));
        let file = tmp.path().join("foo.reg");
        let taken = backup_path(&file, at(10, 0, 0));
        std::fs::write(&taken, "older snapshot").unwrap();

        let mut registry = Registry::new(&hal);
        let report = registry
            .import_key_with_backup(&RegistryTransfer::new(r"HKCU\Foo", RegArch::X64, &file))
            .unwrap();

        assert_ne!(report.backup, taken);
        assert_eq!(report.backup, with_counter(&taken, 1));
        assert_eq!(std::fs::read_to_string(&taken).unwrap(), "older snapshot");
    }
}
