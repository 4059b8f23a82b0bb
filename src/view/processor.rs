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

use std::sync::{Arc, Weak};

use tracing::{debug, warn};

use crate::device::property::Property;
use crate::device::common::DeviceResult;
use crate::device::providers::{apply_temperature_unit, Provider, SampleCache};
use crate::device::types::{PropertyValue, Unit};
use crate::view::display::Listener;

struct Slot {
    property: Property,
    listeners: Vec<Weak<dyn Listener>>,
    /// Set after the property reported `ERR`; never polled again.
    retired: bool,
}

/// Outcome of one [`ProcessorHandler::process`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Properties queried this tick
    pub polled: usize,
    /// Properties that reported `ERR` this tick and were retired
    pub retired: usize,
    /// Listener calls that returned an error
    pub listener_errors: usize,
}

/// Drives one polling tick: resolves every registered property and hands
/// the value to that property's listeners.
#[derive(Default)]
pub struct ProcessorHandler {
    slots: Vec<Slot>,
}

impl ProcessorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `property` with its listeners. Only weak handles are kept,
    /// so a dropped listener simply stops receiving values.
    pub fn add_property(&mut self, property: Property, listeners: &[Arc<dyn Listener>]) {
        self.slots.push(Slot {
            property,
            listeners: listeners.iter().map(Arc::downgrade).collect(),
            retired: false,
        });
    }

    /// Poll every live property in registration order.
    ///
    /// A failing property or listener never stops the rest of the tick.
    pub fn process(&mut self, provider: &dyn Provider) -> TickSummary {
        let mut summary = TickSummary::default();
        let mut cache = SampleCache::new(provider.runner());

        for slot in self.slots.iter_mut().filter(|slot| !slot.retired) {
            let value = slot.property.query(provider, &mut cache);
            summary.polled += 1;

            slot.listeners.retain(|listener| listener.strong_count() > 0);
            for listener in slot.listeners.iter().filter_map(Weak::upgrade) {
                if let Err(e) = listener.handle(&value) {
                    summary.listener_errors += 1;
                    warn!("{} listener failed: {e}", slot.property.name());
                }
            }

            if value == PropertyValue::Err {
                warn!(
                    "{} is unavailable; it will not be polled again",
                    slot.property.name()
                );
                slot.retired = true;
                summary.retired += 1;
            }
        }

        debug!(
            "tick: {} polled, {} retired, {} command(s) spawned",
            summary.polled,
            summary.retired,
            cache.len()
        );
        summary
    }

    /// Switch the registered temperature properties to `unit`. Retired
    /// properties stay retired.
    pub fn set_temperature_unit(&mut self, unit: Unit) -> DeviceResult<()> {
        apply_temperature_unit(self.slots.iter_mut().map(|slot| &mut slot.property), unit)
    }

    /// Forget every registration. Used before a reload.
    pub fn reset(&mut self) {
        self.slots.clear();
    }

    /// Properties in registration order.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.slots.iter().map(|slot| &slot.property)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registered properties that are still polled.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.retired).count()
    }

    /// Listeners of `index` that are still alive.
    pub fn listener_count(&self, index: usize) -> usize {
        self.slots.get(index).map_or(0, |slot| {
            slot.listeners
                .iter()
                .filter(|listener| listener.strong_count() > 0)
                .count()
        })
    }
}
