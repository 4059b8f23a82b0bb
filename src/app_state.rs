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

use crate::common::config::{Settings, TemperatureUnit};
use crate::device::common::parsers::gpu_count;
use crate::device::common::{CommandRunner, Spawner};
use crate::device::provider_factory::create_provider;
use crate::device::providers::Provider;
use crate::device::types::Unit;
use crate::error::{Error, Result};
use crate::ui::notification::NotificationManager;
use crate::view::display::{DisplayManager, Listener};
use crate::view::processor::{ProcessorHandler, TickSummary};

/// Everything one running instance owns: settings, the active provider,
/// the property/listener tables and pending notifications.
///
/// A reload replaces the provider and both tables wholesale; only the
/// settings survive it.
pub struct AppContext {
    settings: Settings,
    runner: Arc<dyn CommandRunner>,
    provider: Option<Box<dyn Provider>>,
    gpu_names: Vec<String>,
    handler: ProcessorHandler,
    display: DisplayManager,
    notifications: NotificationManager,
    torn_down: bool,
}

impl AppContext {
    /// Discover GPUs with the real vendor tools.
    pub fn init(settings: Settings) -> Result<Self> {
        Self::with_runner(settings, Arc::new(Spawner::new()))
    }

    pub fn with_runner(settings: Settings, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let mut ctx = Self {
            settings,
            runner,
            provider: None,
            gpu_names: Vec::new(),
            handler: ProcessorHandler::new(),
            display: DisplayManager::new(),
            notifications: NotificationManager::new(),
            torn_down: false,
        };
        ctx.reload()?;
        Ok(ctx)
    }

    /// Rebuild provider, properties and listeners from the current settings.
    ///
    /// On failure the context is left empty: ticks do nothing until a later
    /// reload succeeds.
    pub fn reload(&mut self) -> Result<()> {
        self.handler.reset();
        self.display.clear();
        self.provider = None;
        self.gpu_names.clear();
        self.torn_down = false;

        let mut provider = match create_provider(self.settings.provider, self.runner.clone()) {
            Ok(provider) => provider,
            Err(e) => {
                self.notifications.error(e.to_string());
                return Err(e);
            }
        };

        let names = match provider.gpu_names() {
            Ok(names) => names,
            Err(e) => {
                warn!("{} provider could not list GPUs: {e}", provider.name());
                self.notifications
                    .error_with_body("Could not list GPUs".to_string(), e.to_string());
                return Err(Error::Discovery(e));
            }
        };

        let count = gpu_count(&names);
        provider.properties(count);
        if let Err(e) = provider.set_temperature_unit(self.settings.temperature_unit.into()) {
            warn!("{e}");
        }

        // Register the provider's own sequence so it stays the live one
        let properties = provider.retrieve_properties().to_vec();
        for (slot, property) in properties.into_iter().enumerate() {
            let active = self.settings.is_active(slot);
            let listener = self.display.attach(&property, active);
            if active {
                let listener: Arc<dyn Listener> = listener;
                self.handler.add_property(property, &[listener]);
            }
        }

        info!(
            "Loaded {} provider: {count} GPU(s), {} properties, {} active",
            provider.name(),
            self.display.len(),
            self.handler.len()
        );

        self.provider = Some(provider);
        self.gpu_names = names;
        Ok(())
    }

    /// Replace the settings and reload.
    pub fn apply_settings(&mut self, settings: Settings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        self.reload()
    }

    /// Change the temperature unit in place. Unlike a reload this keeps
    /// retired properties retired.
    pub fn set_temperature_unit(&mut self, unit: TemperatureUnit) {
        self.settings.temperature_unit = unit;
        let unit: Unit = unit.into();

        if let Some(provider) = self.provider.as_mut() {
            if let Err(e) = provider.set_temperature_unit(unit) {
                warn!("{e}");
            }
        }
        if let Err(e) = self.handler.set_temperature_unit(unit) {
            warn!("{e}");
        }
        info!("Temperature unit set to {unit:?}");
    }

    /// One poll of every active property.
    pub fn tick(&mut self) -> TickSummary {
        self.notifications.update();
        match (&self.provider, self.torn_down) {
            (Some(provider), false) => self.handler.process(provider.as_ref()),
            _ => TickSummary::default(),
        }
    }

    /// Open the provider's native settings tool, or notify why there is none.
    pub fn open_settings(&mut self) {
        match &self.provider {
            Some(provider) => provider.open_settings(&mut self.notifications),
            None => self
                .notifications
                .error("No GPU provider is loaded".to_string()),
        }
    }

    /// Drop every table. Ticks after this are no-ops.
    pub fn teardown(&mut self) {
        self.handler.reset();
        self.display.clear();
        self.provider = None;
        self.torn_down = true;
        info!("Torn down");
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn gpu_names(&self) -> &[String] {
        &self.gpu_names
    }

    pub fn gpu_count(&self) -> usize {
        gpu_count(&self.gpu_names)
    }

    pub fn provider(&self) -> Option<&dyn Provider> {
        self.provider.as_deref()
    }

    pub fn handler(&self) -> &ProcessorHandler {
        &self.handler
    }

    pub fn display(&self) -> &DisplayManager {
        &self.display
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationManager {
        &mut self.notifications
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}
