use chrono::NaiveDate;
use papp_core::registry::backup_path;
use papp_core::{PappError, RegArch, RegStatus, Registry, RegistryTransfer};
use papp_hal::{CommandSpec, FakeHal, FakeResponse, Operation};
use std::path::PathBuf;

/// Makes `reg export` behave like the real tool: write the target file.
fn export_writes_file(hal: &FakeHal) {
    hal.on_command("reg export", |spec: &CommandSpec| {
        let file = PathBuf::from(&spec.get_args()[2]);
        std::fs::write(file, "Windows Registry Editor Version 5.00\r\n")
    });
}

fn fixed_clock(hal: &FakeHal) {
    hal.set_now(
        NaiveDate::from_ymd_opt(2024, 11, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap(),
    );
}

#[test]
fn export_leaves_file_on_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let hal = FakeHal::new();
    export_writes_file(&hal);
    let file = tmp.path().join("foo.reg");

    let status = Registry::new(&hal)
        .export_key(&RegistryTransfer::new(r"HKCU\Software\Foo", RegArch::X64, &file))
        .unwrap();

    assert_eq!(status, RegStatus::Completed);
    assert!(file.exists());
    assert_eq!(
        hal.operations()[0].command_line(),
        format!(r"reg export HKCU\Software\Foo {} /y /reg:64", file.display())
    );
}

#[test]
fn import_exports_backup_before_importing() {
    let tmp = tempfile::tempdir().unwrap();
    let hal = FakeHal::new();
    fixed_clock(&hal);
    let file = tmp.path().join("foo.reg");
    std::fs::write(&file, "Windows Registry Editor Version 5.00\r\n").unwrap();

    let mut registry = Registry::new(&hal);
    let report = registry
        .import_key_with_backup(&RegistryTransfer::new(r"HKCU\Software\Foo", RegArch::X32, &file))
        .unwrap();

    let ops = hal.operations();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].args()[0], "export");
    assert_eq!(ops[0].args()[1], r"HKCU\Software\Foo");
    assert_eq!(ops[0].args()[4], "/reg:32");
    assert_eq!(PathBuf::from(&ops[0].args()[2]), report.backup);
    assert_eq!(
        ops[1],
        Operation::Command {
            program: "reg".into(),
            args: vec!["import".into(), file.display().to_string(), "/reg:32".into()],
            cwd: None,
            hide_window: true,
        }
    );

    assert_ne!(report.backup, file);
    assert_eq!(report.backup, tmp.path().join("foo.reg.20241105143000"));
    assert_eq!(report.backup_status, RegStatus::Completed);
    assert_eq!(report.import_status, RegStatus::Completed);
}

#[test]
fn import_nonzero_exit_is_soft_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let hal = FakeHal::new();
    hal.respond("reg import", FakeResponse::exit(1).with_stderr("ERROR: Error accessing the registry."));
    let file = tmp.path().join("foo.reg");
    std::fs::write(&file, "garbage").unwrap();

    let report = Registry::new(&hal)
        .import_key_with_backup(&RegistryTransfer::new(r"HKCU\Software\Foo", RegArch::X64, &file))
        .unwrap();

    assert_eq!(
        report.import_status,
        RegStatus::SoftFailure {
            exit_code: 1,
            stderr: "ERROR: Error accessing the registry.".into()
        }
    );
}

#[test]
fn import_launch_failure_is_import_error() {
    let tmp = tempfile::tempdir().unwrap();
    let hal = FakeHal::new();
    hal.not_found("reg import");
    let file = tmp.path().join("foo.reg");
    std::fs::write(&file, "data").unwrap();

    let err = Registry::new(&hal)
        .import_key_with_backup(&RegistryTransfer::new(r"HKCU\Software\Foo", RegArch::X64, &file))
        .unwrap_err();

    assert!(matches!(err, PappError::Import { file: ref f, .. } if *f == file));
}

#[test]
fn backup_launch_failure_stops_before_import() {
    let tmp = tempfile::tempdir().unwrap();
    let hal = FakeHal::new();
    hal.not_found("reg export");
    let file = tmp.path().join("foo.reg");
    std::fs::write(&file, "data").unwrap();

    let err = Registry::new(&hal)
        .import_key_with_backup(&RegistryTransfer::new(r"HKCU\Software\Foo", RegArch::X64, &file))
        .unwrap_err();

    assert!(matches!(err, PappError::Export { .. }));
    assert_eq!(hal.operation_count(), 1);
}

#[test]
fn successive_imports_never_share_a_backup() {
    let tmp = tempfile::tempdir().unwrap();
    let hal = FakeHal::new();
    fixed_clock(&hal);
    let file = tmp.path().join("foo.reg");
    let transfer = RegistryTransfer::new(r"HKCU\Software\Foo", RegArch::X64, &file);

    // Same second, no file written by the fake: names must still differ.
    let mut registry = Registry::new(&hal);
    let first = registry.import_key_with_backup(&transfer).unwrap();
    let second = registry.import_key_with_backup(&transfer).unwrap();
    assert_ne!(first.backup, second.backup);

    // Later second, backups written to disk by a fresh instance.
    export_writes_file(&hal);
    hal.advance(chrono::Duration::seconds(1));
    let mut registry = Registry::new(&hal);
    let third = registry.import_key_with_backup(&transfer).unwrap();
    let fourth = registry.import_key_with_backup(&transfer).unwrap();
    assert_ne!(third.backup, fourth.backup);
    assert!(third.backup.exists());
    assert!(fourth.backup.exists());
    assert!(third.backup < fourth.backup);
    assert_eq!(
        third.backup,
        backup_path(
            &file,
            NaiveDate::from_ymd_opt(2024, 11, 5)
                .unwrap()
                .and_hms_opt(14, 30, 1)
                .unwrap()
        )
    );
}
