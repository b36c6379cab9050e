//! papp core library.
//!
//! Building blocks for portable application launchers: a synchronous command
//! runner, registry export/import with timestamped backups, the per-app log
//! file, and the small path/env helpers a launcher needs before it hands over
//! to the bundled application.

pub mod env;
pub mod launcher;
pub mod logging;
pub mod registry;
pub mod runner;

#[cfg(test)]
pub mod test_env;

pub use launcher::{create_folder, find_electron_app_folder, Papp, PappSettings};
pub use logging::LogContext;
pub use papp_error::{PappError, PappResult};
pub use registry::{ImportReport, RegArch, RegStatus, Registry, RegistryTransfer};
