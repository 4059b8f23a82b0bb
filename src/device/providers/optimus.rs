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

use std::sync::Arc;

use tracing::{info, warn};

use crate::device::common::constants::{OPTIMUS_SETTINGS_ARGS, OPTIRUN};
use crate::device::common::{CommandRunner, DeviceError, DeviceResult};
use crate::device::property::Property;
use crate::device::providers::{command_line, Provider, SampleCache, SmiProvider};
use crate::device::types::{Reading, Unit};
use crate::ui::notification::NotificationManager;

/// Hybrid-graphics laptops (Bumblebee): the discrete GPU is only powered
/// while a program runs under `optirun`, so every query goes through it.
pub struct OptimusProvider {
    inner: SmiProvider,
}

impl OptimusProvider {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            inner: SmiProvider::with_launcher(runner, OPTIRUN),
        }
    }

    pub fn settings_command() -> String {
        command_line(None, OPTIRUN, OPTIMUS_SETTINGS_ARGS)
    }
}

impl Provider for OptimusProvider {
    fn name(&self) -> &'static str {
        "optimus"
    }

    fn gpu_names(&mut self) -> DeviceResult<Vec<String>> {
        if !self.inner.runner().find_program(OPTIRUN) {
            return Err(DeviceError::ToolMissing(OPTIRUN.to_string()));
        }
        self.inner.gpu_names()
    }

    fn properties(&mut self, gpu_count: usize) -> Vec<Property> {
        self.inner.properties(gpu_count)
    }

    fn retrieve_properties(&self) -> &[Property] {
        self.inner.retrieve_properties()
    }

    fn set_temperature_unit(&mut self, unit: Unit) -> DeviceResult<()> {
        self.inner.set_temperature_unit(unit)
    }

    fn has_settings(&self) -> bool {
        true
    }

    fn open_settings(&self, notifications: &mut NotificationManager) {
        match self.inner.runner().launch(&Self::settings_command()) {
            Ok(()) => info!("Launched nvidia-settings through optirun"),
            Err(e) => {
                warn!("nvidia-settings could not be opened through optirun: {e}");
                notifications
                    .error_with_body("Could not open nvidia-settings".to_string(), e.to_string());
            }
        }
    }

    fn read(&self, property: &Property, cache: &mut SampleCache<'_>) -> DeviceResult<Reading> {
        self.inner.read(property, cache)
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.inner.runner()
    }
}
