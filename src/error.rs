// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Unified error types for the nvidia-util library.
//!
//! Tool and parse failures inside a tick never reach this type: they become
//! `ERR` on the affected property. [`enum@Error`] covers what aborts a whole
//! operation, such as discovery or loading settings.
//!
//! # Example
//!
//! ```rust,no_run
//! use nvidia_util::{AppContext, Result, Settings};
//!
//! fn main() -> Result<()> {
//!     let mut ctx = AppContext::init(Settings::default())?;
//!     ctx.tick();
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::device::common::DeviceError;

/// The main error type for nvidia-util operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Neither nvidia-smi nor nvidia-settings is on PATH.
    #[error("nvidia-settings or nvidia-smi not present")]
    NoToolsFound,

    /// The selected provider could not list the GPUs.
    ///
    /// The whole reload is aborted; the previous property set (if any) is
    /// already gone. The message matches the notification a live context
    /// posts, so callers without a context can show it as is.
    #[error("Could not list GPUs: {0}")]
    Discovery(#[source] DeviceError),

    /// Settings could not be understood.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for nvidia-util operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returned by a listener that could not take a value.
///
/// The processor logs it and moves on to the next listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("listener is no longer attached")]
    Detached,

    #[error("listener rejected value: {0}")]
    Rejected(String),
}
