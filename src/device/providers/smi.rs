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

use tracing::{debug, warn};

use crate::device::common::constants::{NVIDIA_SMI, SMI_GPU_NAMES_ARGS};
use crate::device::common::parsers::{
    check_smi_output, label_gpu_names, parse_smi_row, smi_value_line, SmiRow,
};
use crate::device::common::{CommandRunner, DeviceError, DeviceResult};
use crate::device::property::Property;
use crate::device::providers::{
    apply_temperature_unit, build_properties, command_line, Provider, SampleCache,
};
use crate::device::types::{DataSource, MetricKind, Reading, Unit};
use crate::ui::notification::NotificationManager;

/// Metrics the plain nvidia-smi table carries.
pub const SMI_KINDS: [MetricKind; 5] = MetricKind::ALL;

/// Reads every metric from one batched `nvidia-smi` table per tick.
pub struct SmiProvider {
    runner: Arc<dyn CommandRunner>,
    launcher: Option<&'static str>,
    stored: Vec<Property>,
}

impl SmiProvider {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            launcher: None,
            stored: Vec::new(),
        }
    }

    /// Prefix every invocation with `launcher`, e.g. `optirun`.
    pub fn with_launcher(runner: Arc<dyn CommandRunner>, launcher: &'static str) -> Self {
        Self {
            runner,
            launcher: Some(launcher),
            stored: Vec::new(),
        }
    }

    /// The batched table command shared by every property in a tick.
    pub fn table_command(&self) -> String {
        command_line(self.launcher, NVIDIA_SMI, "")
    }

    /// Fetch (or reuse) this tick's table and parse the row of `gpu_index`.
    pub fn read_row(&self, gpu_index: usize, cache: &mut SampleCache<'_>) -> DeviceResult<SmiRow> {
        let output = cache.run(&self.table_command())?;
        check_smi_output(&output)?;
        let line = smi_value_line(&output, gpu_index)?;
        parse_smi_row(line)
    }
}

/// Select the metric `kind` out of a parsed table row.
pub fn reading_from_row(kind: MetricKind, row: &SmiRow) -> Reading {
    match kind {
        MetricKind::Utilization => Reading::Percent(row.utilization),
        MetricKind::Temperature => Reading::Celsius(row.temperature),
        MetricKind::Memory => Reading::Memory {
            used: row.used_memory,
            total: row.total_memory,
        },
        MetricKind::Fan => Reading::Percent(row.fan),
        MetricKind::Power => Reading::Watts(row.power_draw),
    }
}

impl Provider for SmiProvider {
    fn name(&self) -> &'static str {
        "smi"
    }

    fn gpu_names(&mut self) -> DeviceResult<Vec<String>> {
        let command = command_line(self.launcher, NVIDIA_SMI, SMI_GPU_NAMES_ARGS);
        let output = self.runner.run(&command)?;
        check_smi_output(&output).inspect_err(|e| warn!("nvidia-smi discovery rejected: {e}"))?;

        if output.trim().is_empty() {
            return Err(DeviceError::ParseError(
                "nvidia-smi listed no GPUs".to_string(),
            ));
        }

        let labels = label_gpu_names(&output);
        debug!("nvidia-smi found {:?}", labels);
        Ok(labels)
    }

    fn properties(&mut self, gpu_count: usize) -> Vec<Property> {
        self.stored = build_properties(&SMI_KINDS, gpu_count, DataSource::Smi);
        self.stored.clone()
    }

    fn retrieve_properties(&self) -> &[Property] {
        &self.stored
    }

    fn set_temperature_unit(&mut self, unit: Unit) -> DeviceResult<()> {
        apply_temperature_unit(&mut self.stored, unit)
    }

    fn has_settings(&self) -> bool {
        false
    }

    fn open_settings(&self, notifications: &mut NotificationManager) {
        notifications.error_with_body(
            "Settings are not available in smi mode".to_string(),
            "Switch to a provider which supports nvidia-settings".to_string(),
        );
    }

    fn read(&self, property: &Property, cache: &mut SampleCache<'_>) -> DeviceResult<Reading> {
        let row = self.read_row(property.gpu_index(), cache)?;
        Ok(reading_from_row(property.kind(), &row))
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }
}
