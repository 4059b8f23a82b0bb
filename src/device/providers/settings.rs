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

use tracing::{debug, info, warn};

use crate::device::common::constants::{
    ATTR_CORE_TEMP, ATTR_FAN_SPEED, ATTR_TOTAL_MEMORY, ATTR_USED_MEMORY, ATTR_UTILIZATION,
    NVIDIA_SETTINGS, SETTINGS_GPU_NAMES_ARGS,
};
use crate::device::common::parsers::{
    label_gpu_names, parse_first_line_number, parse_settings_gpus, parse_settings_utilization,
};
use crate::device::common::{CommandRunner, DeviceError, DeviceResult};
use crate::device::property::Property;
use crate::device::providers::{
    apply_temperature_unit, build_properties, command_line, Provider, SampleCache,
};
use crate::device::types::{DataSource, MetricKind, Reading, Unit};
use crate::ui::notification::NotificationManager;

/// nvidia-settings has no power draw attribute.
pub const SETTINGS_KINDS: [MetricKind; 4] = [
    MetricKind::Utilization,
    MetricKind::Temperature,
    MetricKind::Memory,
    MetricKind::Fan,
];

/// Reads each metric with its own `nvidia-settings -q` call per GPU.
pub struct SettingsProvider {
    runner: Arc<dyn CommandRunner>,
    stored: Vec<Property>,
    /// `(index, name)` pairs from the last discovery
    gpus: Vec<(usize, String)>,
}

impl SettingsProvider {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            stored: Vec::new(),
            gpus: Vec::new(),
        }
    }

    /// GPUs as nvidia-settings enumerates them.
    pub fn discovered_gpus(&self) -> &[(usize, String)] {
        &self.gpus
    }

    /// Query the GPU list without touching provider state.
    pub fn query_gpus(runner: &dyn CommandRunner) -> DeviceResult<Vec<(usize, String)>> {
        let output = runner.run(&command_line(None, NVIDIA_SETTINGS, SETTINGS_GPU_NAMES_ARGS))?;
        let gpus = parse_settings_gpus(&output);
        if gpus.is_empty() {
            return Err(DeviceError::ParseError(
                "nvidia-settings listed no GPUs".to_string(),
            ));
        }
        Ok(gpus)
    }

    /// `nvidia-settings -q [gpu:0]/GPUCoreTemp -t`
    pub fn attribute_command(target: &str, index: usize, attribute: &str) -> String {
        command_line(
            None,
            NVIDIA_SETTINGS,
            &format!("-q [{target}:{index}]/{attribute} -t"),
        )
    }

    fn query_number(
        &self,
        target: &str,
        gpu_index: usize,
        attribute: &str,
        cache: &mut SampleCache<'_>,
    ) -> DeviceResult<u64> {
        let output = cache.run(&Self::attribute_command(target, gpu_index, attribute))?;
        parse_first_line_number(&output)
    }

    /// Read `kind` for `gpu_index`, independent of which source the
    /// property was built for.
    pub fn read_kind(
        &self,
        kind: MetricKind,
        gpu_index: usize,
        cache: &mut SampleCache<'_>,
    ) -> DeviceResult<Reading> {
        match kind {
            MetricKind::Utilization => {
                let output =
                    cache.run(&Self::attribute_command("gpu", gpu_index, ATTR_UTILIZATION))?;
                parse_settings_utilization(&output).map(Reading::Percent)
            }
            MetricKind::Temperature => self
                .query_number("gpu", gpu_index, ATTR_CORE_TEMP, cache)
                .map(Reading::Celsius),
            MetricKind::Memory => {
                let used = self.query_number("gpu", gpu_index, ATTR_USED_MEMORY, cache)?;
                let total = self.query_number("gpu", gpu_index, ATTR_TOTAL_MEMORY, cache)?;
                Ok(Reading::Memory { used, total })
            }
            // One fan per GPU: fan N belongs to GPU N
            MetricKind::Fan => self
                .query_number("fan", gpu_index, ATTR_FAN_SPEED, cache)
                .map(Reading::Percent),
            MetricKind::Power => Err(DeviceError::Unsupported(
                "nvidia-settings does not report power draw".to_string(),
            )),
        }
    }
}

impl Provider for SettingsProvider {
    fn name(&self) -> &'static str {
        "settings"
    }

    fn gpu_names(&mut self) -> DeviceResult<Vec<String>> {
        let gpus = Self::query_gpus(self.runner.as_ref())
            .inspect_err(|e| warn!("nvidia-settings discovery failed: {e}"))?;

        let mut text = String::new();
        for (_, name) in &gpus {
            text.push_str(name);
            text.push('\n');
        }
        self.gpus = gpus;

        let labels = label_gpu_names(&text);
        debug!("nvidia-settings found {:?}", labels);
        Ok(labels)
    }

    fn properties(&mut self, gpu_count: usize) -> Vec<Property> {
        self.stored = build_properties(&SETTINGS_KINDS, gpu_count, DataSource::Settings);
        self.stored.clone()
    }

    fn retrieve_properties(&self) -> &[Property] {
        &self.stored
    }

    fn set_temperature_unit(&mut self, unit: Unit) -> DeviceResult<()> {
        apply_temperature_unit(&mut self.stored, unit)
    }

    fn has_settings(&self) -> bool {
        true
    }

    fn open_settings(&self, notifications: &mut NotificationManager) {
        match self.runner.launch(NVIDIA_SETTINGS) {
            Ok(()) => info!("Launched nvidia-settings"),
            Err(e) => {
                warn!("nvidia-settings could not be opened: {e}");
                notifications
                    .error_with_body("Could not open nvidia-settings".to_string(), e.to_string());
            }
        }
    }

    fn read(&self, property: &Property, cache: &mut SampleCache<'_>) -> DeviceResult<Reading> {
        self.read_kind(property.kind(), property.gpu_index(), cache)
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }
}
