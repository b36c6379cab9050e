//! HAL trait definitions and implementations.
//!
//! This module defines the traits for system operations and provides both a
//! real (NativeHal) and a recording (FakeHal) implementation.

pub mod clock_ops;
pub mod fake_hal;
pub mod native_hal;
pub mod process_ops;

pub use clock_ops::ClockOps;
pub use fake_hal::{FakeHal, FakeResponse, Operation};
pub use native_hal::NativeHal;
pub use process_ops::{CommandResult, CommandSpec, ProcessOps};

/// Complete HAL combining all system operation traits.
pub trait SystemHal: ProcessOps + ClockOps + Send + Sync {}

/// Automatically implement SystemHal for any type implementing all required traits.
impl<T> SystemHal for T where T: ProcessOps + ClockOps + Send + Sync {}
