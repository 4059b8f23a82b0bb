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

//! # nvidia-util
//!
//! Polls NVIDIA GPU telemetry through `nvidia-smi` and/or `nvidia-settings`
//! and hands per-GPU, per-metric display values to listeners.
//!
//! ```rust,no_run
//! use nvidia_util::{AppContext, Settings};
//!
//! fn main() -> nvidia_util::Result<()> {
//!     let mut ctx = AppContext::init(Settings::default())?;
//!     ctx.tick();
//!     for line in ctx.display().render() {
//!         println!("{line}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod app_state;
pub mod cli;
pub mod device;
pub mod error;
pub mod ui;
pub mod utils;
pub mod view;

pub mod common {
    pub mod config;
}

pub use app_state::AppContext;
pub use common::config::{AppConfig, Settings, TemperatureUnit};
pub use device::common::{CommandRunner, DeviceError, DeviceResult, RawSample, Spawner};
pub use device::{
    MetricKind, Property, PropertyValue, Provider, ProviderKind, SampleCache, Unit,
};
pub use error::{Error, ListenerError, Result};
pub use view::{DisplayManager, Listener, PanelListener, PollScheduler, ProcessorHandler};
