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

use tracing::debug;

use crate::device::common::parsers::memory_percentage;
use crate::device::common::{DeviceError, DeviceResult};
use crate::device::providers::{Provider, SampleCache};
use crate::device::types::{DataSource, MetricKind, PropertyValue, Reading, Unit};
use crate::utils::units::celsius_to_fahrenheit;

/// One metric of one GPU.
///
/// The GPU index and metric kind are fixed at construction; only the unit
/// of a temperature property can change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    kind: MetricKind,
    gpu_index: usize,
    source: DataSource,
    unit: Unit,
}

impl Property {
    pub fn new(kind: MetricKind, gpu_index: usize, source: DataSource) -> Self {
        Self {
            kind,
            gpu_index,
            source,
            unit: kind.default_unit(),
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn gpu_index(&self) -> usize {
        self.gpu_index
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    /// e.g. "GPU 0 Temperature"
    pub fn name(&self) -> String {
        format!("GPU {} {}", self.gpu_index, self.kind.label())
    }

    pub fn icon(&self) -> &'static str {
        self.kind.icon()
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Switch the display unit. Only temperature properties accept a
    /// different unit, and only Celsius or Fahrenheit.
    pub fn set_unit(&mut self, unit: Unit) -> DeviceResult<()> {
        match self.kind {
            MetricKind::Temperature if unit.is_temperature() => {
                self.unit = unit;
                Ok(())
            }
            _ if unit == self.unit => Ok(()),
            _ => Err(DeviceError::Unsupported(format!(
                "{} cannot be shown in {unit:?}",
                self.name()
            ))),
        }
    }

    /// Ask `provider` for this property's current value and format it.
    pub fn query(&self, provider: &dyn Provider, cache: &mut SampleCache<'_>) -> PropertyValue {
        self.handle(provider.read(self, cache))
    }

    /// Turn a raw reading into display text, or `ERR` when the reading failed.
    pub fn handle(&self, reading: DeviceResult<Reading>) -> PropertyValue {
        match reading.and_then(|r| self.format(r)) {
            Ok(text) => PropertyValue::Text(text),
            Err(e) => {
                debug!("{}: {e}", self.name());
                PropertyValue::Err
            }
        }
    }

    fn format(&self, reading: Reading) -> DeviceResult<String> {
        let suffix = self.unit.suffix();
        let value = match (self.kind, reading) {
            (MetricKind::Utilization | MetricKind::Fan, Reading::Percent(percent)) => {
                percent.to_string()
            }
            (MetricKind::Temperature, Reading::Celsius(celsius)) => match self.unit {
                Unit::Fahrenheit => celsius_to_fahrenheit(celsius as i64).to_string(),
                _ => celsius.to_string(),
            },
            (MetricKind::Memory, Reading::Memory { used, total }) => {
                memory_percentage(used, total)?
            }
            (MetricKind::Power, Reading::Watts(watts)) => watts.to_string(),
            (kind, reading) => {
                return Err(DeviceError::ParseError(format!(
                    "{reading:?} is not a {kind} reading"
                )))
            }
        };

        Ok(format!("{value}{suffix}"))
    }
}
