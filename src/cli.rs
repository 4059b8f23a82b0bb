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

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::common::config::{Settings, TemperatureUnit};
use crate::device::provider_factory::ProviderKind;
use crate::error::Result;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file. Defaults to <config dir>/nvidia-util/settings.json.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Telemetry provider, overriding the settings file.
    #[arg(long, value_enum, global = true)]
    pub provider: Option<ProviderKind>,

    /// The interval in seconds at which to poll the GPUs.
    #[arg(short, long, global = true)]
    pub interval: Option<u64>,

    /// Show temperatures in Fahrenheit.
    #[arg(long, global = true)]
    pub fahrenheit: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll and print GPU metrics until interrupted. (default)
    Watch(WatchArgs),
    /// List the GPUs the selected provider finds.
    List,
    /// Open the provider's native settings tool.
    Settings,
    /// Enable or disable the property in the given slot and save.
    Toggle(ToggleArgs),
}

#[derive(Parser, Clone, Default)]
pub struct WatchArgs {
    /// Poll once and exit.
    #[arg(long)]
    pub once: bool,
}

#[derive(Parser, Clone)]
pub struct ToggleArgs {
    /// Property slot, as printed by `watch`.
    pub slot: usize,
}

impl Cli {
    /// `--config`, or the per-user default location.
    pub fn settings_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Settings::default_path(),
        }
    }

    /// Apply command-line overrides on top of loaded settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(provider) = self.provider {
            settings.provider = provider;
        }
        if let Some(interval) = self.interval {
            settings.refresh_interval_secs = interval;
        }
        if self.fahrenheit {
            settings.temperature_unit = TemperatureUnit::Fahrenheit;
        }
    }
}
