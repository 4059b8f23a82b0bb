// Common utilities for device modules: command execution, error handling, and text parsing.

pub mod command_executor;
pub mod constants;
pub mod error_handling;
pub mod parsers;

/* Re-exports for convenience */
pub use command_executor::{CommandRunner, RawSample, Spawner};
pub use error_handling::{DeviceError, DeviceResult};
