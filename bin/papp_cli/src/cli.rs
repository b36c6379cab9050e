use clap::{Args, Parser, Subcommand};
use papp_core::RegArch;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Portable application launcher toolkit")]
pub struct Cli {
    /// Application identifier; the log file is `<exe dir>/<id>.log`
    #[arg(long, global = true, default_value = "papp")]
    pub id: String,

    /// Display name used in log lines (defaults to the id)
    #[arg(long, global = true)]
    pub name: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a program, capture its output, and print its exit code
    Exec {
        #[arg(long)]
        cwd: Option<PathBuf>,
        #[arg(long)]
        hide_window: bool,
        program: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Export a registry key to a .reg file
    RegExport(RegArgs),
    /// Back up a registry key, then import a .reg file into it
    RegImport(RegArgs),
    /// Start the bundled application with its output in the log file
    Launch {
        #[arg(long)]
        process: String,
        #[arg(long)]
        working_dir: Option<PathBuf>,
        /// Registry key restored before launch and saved back after exit
        #[arg(long, requires = "restore_file")]
        restore_key: Option<String>,
        #[arg(long, default_value = "64")]
        restore_arch: RegArch,
        #[arg(long, requires = "restore_key")]
        restore_file: Option<PathBuf>,
        #[arg(last = true)]
        args: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct RegArgs {
    #[arg(long)]
    pub key: String,
    #[arg(long, default_value = "64")]
    pub arch: RegArch,
    #[arg(long)]
    pub file: PathBuf,
}
