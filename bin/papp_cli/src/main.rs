use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use papp_core::registry::ImportReport;
use papp_core::{runner, LogContext, Papp, PappSettings, RegStatus, Registry, RegistryTransfer};
use papp_hal::{CommandSpec, NativeHal, SystemHal};

mod cli;

fn main() {
    let cli = cli::Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("papp: {:#}", err);
            std::process::exit(1);
        }
    }
}

fn run(cli: cli::Cli) -> anyhow::Result<i32> {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let name = cli.name.clone().unwrap_or_else(|| cli.id.clone());
    let settings = PappSettings::new(cli.id.as_str(), name).with_log_level(level);
    let (papp, log) = Papp::init(settings).context("initialise launcher")?;

    let hal = NativeHal::new();
    let outcome = dispatch(&hal, papp, &log, cli.command);

    // The entry point owns termination: errors are logged as fatal here.
    if let Err(err) = &outcome {
        log::error!("FATAL {:#}", err);
    }
    log.shutdown().context("flush log file")?;
    outcome
}

fn dispatch<H: SystemHal>(
    hal: &H,
    mut papp: Papp,
    log: &LogContext,
    command: cli::Command,
) -> anyhow::Result<i32> {
    match command {
        cli::Command::Exec {
            cwd,
            hide_window,
            program,
            args,
        } => {
            let mut spec = CommandSpec::new(program).args(&args).hide_window(hide_window);
            if let Some(dir) = cwd {
                spec = spec.current_dir(dir);
            }
            let result = runner::run(hal, spec)?;
            runner::report_exit(&result);
            if !result.stdout().is_empty() {
                println!("{}", result.stdout());
            }
            if !result.stderr().is_empty() {
                eprintln!("{}", result.stderr());
            }
            Ok(result.exit_code())
        }
        cli::Command::RegExport(args) => {
            let transfer = RegistryTransfer::new(args.key, args.arch, args.file);
            let status = Registry::new(hal).export_key(&transfer)?;
            println!("export {}: {}", transfer.file.display(), describe(&status));
            Ok(status_code(&status))
        }
        cli::Command::RegImport(args) => {
            let transfer = RegistryTransfer::new(args.key, args.arch, args.file);
            let report = Registry::new(hal).import_key_with_backup(&transfer)?;
            print_report(&report);
            Ok(status_code(&report.import_status))
        }
        cli::Command::Launch {
            process,
            working_dir,
            restore_key,
            restore_arch,
            restore_file,
            args,
        } => {
            papp.process = process;
            papp.working_dir = working_dir;
            papp.args = args;

            let transfer = match (restore_key, restore_file) {
                (Some(key), Some(file)) => Some(RegistryTransfer::new(key, restore_arch, file)),
                _ => None,
            };
            let mut registry = Registry::new(hal);
            if let Some(transfer) = &transfer {
                registry.import_key_with_backup(transfer)?;
            }

            let code = papp.launch(hal, log)?;

            // Persist whatever the application wrote for the next run.
            if let Some(transfer) = &transfer {
                registry.export_key(transfer)?;
            }
            Ok(code)
        }
    }
}

fn describe(status: &RegStatus) -> String {
    match status {
        RegStatus::Completed => "ok".to_string(),
        RegStatus::SoftFailure { exit_code, stderr } if stderr.is_empty() => {
            format!("reg exited with code {}", exit_code)
        }
        RegStatus::SoftFailure { exit_code, stderr } => {
            format!("reg exited with code {}: {}", exit_code, stderr)
        }
        RegStatus::Skipped => "skipped (no file)".to_string(),
    }
}

fn status_code(status: &RegStatus) -> i32 {
    match status {
        RegStatus::SoftFailure { exit_code, .. } => *exit_code,
        RegStatus::Completed | RegStatus::Skipped => 0,
    }
}

fn print_report(report: &ImportReport) {
    println!(
        "backup {}: {}",
        report.backup.display(),
        describe(&report.backup_status)
    );
    println!("import: {}", describe(&report.import_status));
}
