//! Operating-system abstraction layer for papp launchers.
//!
//! Everything that touches the outside world (child processes, the wall clock)
//! goes through the traits in [`hal`] so launcher flows can be exercised with
//! [`FakeHal`] instead of spawning real tools.

pub mod hal;
pub mod path;

pub use hal::*;
pub use papp_error::{HalError, HalResult};
