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

// nvidia-smi first, nvidia-settings where nvidia-smi cannot answer

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::device::common::{CommandRunner, DeviceResult};
use crate::device::property::Property;
use crate::device::providers::settings::SETTINGS_KINDS;
use crate::device::providers::smi::SMI_KINDS;
use crate::device::providers::{
    apply_temperature_unit, build_properties, Provider, SampleCache, SettingsProvider, SmiProvider,
};
use crate::device::types::{DataSource, MetricKind, Reading, Unit};
use crate::ui::notification::NotificationManager;

/// Which tools answered discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Both,
    SmiOnly,
    SettingsOnly,
}

pub struct CombinedProvider {
    smi: SmiProvider,
    settings: SettingsProvider,
    route: Route,
    /// nvidia-smi GPU index -> nvidia-settings GPU index
    settings_index: Vec<usize>,
    stored: Vec<Property>,
}

impl CombinedProvider {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            smi: SmiProvider::new(runner.clone()),
            settings: SettingsProvider::new(runner),
            route: Route::Both,
            settings_index: Vec::new(),
            stored: Vec::new(),
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    fn settings_gpu(&self, gpu_index: usize) -> usize {
        self.settings_index
            .get(gpu_index)
            .copied()
            .unwrap_or(gpu_index)
    }
}

/// Map every nvidia-smi GPU onto the nvidia-settings GPU with the same name.
///
/// Names match case-insensitively, or when one contains the other
/// (nvidia-settings sometimes drops the vendor prefix). Each nvidia-settings
/// GPU is claimed at most once; a GPU without a match keeps its own index.
pub fn reconcile_gpu_order(smi_names: &[&str], settings_gpus: &[(usize, String)]) -> Vec<usize> {
    let mut claimed = vec![false; settings_gpus.len()];

    smi_names
        .iter()
        .enumerate()
        .map(|(smi_index, smi_name)| {
            let smi_name = smi_name.trim().to_lowercase();
            let found = settings_gpus.iter().enumerate().position(|(slot, (_, name))| {
                let name = name.trim().to_lowercase();
                !claimed[slot]
                    && !name.is_empty()
                    && !smi_name.is_empty()
                    && (name == smi_name || name.contains(&smi_name) || smi_name.contains(&name))
            });

            match found {
                Some(slot) => {
                    claimed[slot] = true;
                    settings_gpus[slot].0
                }
                None => smi_index,
            }
        })
        .collect()
}

fn strip_label(label: &str) -> &str {
    label.split_once(": ").map_or(label, |(_, name)| name)
}

impl Provider for CombinedProvider {
    fn name(&self) -> &'static str {
        "combined"
    }

    fn gpu_names(&mut self) -> DeviceResult<Vec<String>> {
        let smi = self.smi.gpu_names();
        let settings = self.settings.gpu_names();

        match (smi, settings) {
            (Ok(labels), Ok(_)) => {
                self.route = Route::Both;
                let count = labels.len().saturating_sub(1);
                let names: Vec<&str> = labels.iter().take(count).map(|l| strip_label(l)).collect();
                self.settings_index = reconcile_gpu_order(&names, self.settings.discovered_gpus());
                debug!("nvidia-settings order for nvidia-smi GPUs: {:?}", self.settings_index);
                Ok(labels)
            }
            (Ok(labels), Err(e)) => {
                info!("nvidia-settings unavailable ({e}); using nvidia-smi only");
                self.route = Route::SmiOnly;
                self.settings_index.clear();
                Ok(labels)
            }
            (Err(e), Ok(labels)) => {
                info!("nvidia-smi unavailable ({e}); routing through nvidia-settings");
                self.route = Route::SettingsOnly;
                self.settings_index.clear();
                Ok(labels)
            }
            (Err(smi_err), Err(settings_err)) => {
                warn!("no GPU tool answered: nvidia-smi: {smi_err}; nvidia-settings: {settings_err}");
                Err(smi_err)
            }
        }
    }

    fn properties(&mut self, gpu_count: usize) -> Vec<Property> {
        self.stored = match self.route {
            Route::Both | Route::SmiOnly => build_properties(&SMI_KINDS, gpu_count, DataSource::Smi),
            Route::SettingsOnly => {
                build_properties(&SETTINGS_KINDS, gpu_count, DataSource::Settings)
            }
        };
        self.stored.clone()
    }

    fn retrieve_properties(&self) -> &[Property] {
        &self.stored
    }

    fn set_temperature_unit(&mut self, unit: Unit) -> DeviceResult<()> {
        apply_temperature_unit(&mut self.stored, unit)
    }

    fn has_settings(&self) -> bool {
        self.route != Route::SmiOnly
    }

    fn open_settings(&self, notifications: &mut NotificationManager) {
        match self.route {
            Route::SmiOnly => self.smi.open_settings(notifications),
            Route::Both | Route::SettingsOnly => self.settings.open_settings(notifications),
        }
    }

    fn read(&self, property: &Property, cache: &mut SampleCache<'_>) -> DeviceResult<Reading> {
        let kind = property.kind();
        let gpu = property.gpu_index();

        match (property.source(), self.route) {
            (DataSource::Settings, _) | (_, Route::SettingsOnly) => {
                self.settings.read_kind(kind, self.settings_gpu(gpu), cache)
            }
            (DataSource::Smi, Route::SmiOnly) => self.smi.read(property, cache),
            (DataSource::Smi, Route::Both) => match self.smi.read(property, cache) {
                Ok(reading) => Ok(reading),
                Err(e) if kind != MetricKind::Power => {
                    debug!("{}: nvidia-smi failed ({e}), asking nvidia-settings", property.name());
                    self.settings.read_kind(kind, self.settings_gpu(gpu), cache)
                }
                Err(e) => Err(e),
            },
        }
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.smi.runner()
    }
}
