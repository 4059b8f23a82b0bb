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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::device::property::Property;
use crate::device::types::PropertyValue;
use crate::error::ListenerError;

/// A display sink that receives one property's value every tick.
pub trait Listener: Send + Sync {
    fn handle(&self, value: &PropertyValue) -> Result<(), ListenerError>;
}

/// Shows the latest value of one property, e.g. one label in a panel.
///
/// Receiving `ERR` hides the listener for the rest of the session.
pub struct PanelListener {
    label: String,
    icon: &'static str,
    text: Mutex<String>,
    active: AtomicBool,
    /// Cleared once the display drops this listener's slot
    attached: AtomicBool,
}

impl PanelListener {
    pub fn new(property: &Property) -> Self {
        Self {
            label: property.name(),
            icon: property.icon(),
            text: Mutex::new(String::new()),
            active: AtomicBool::new(true),
            attached: AtomicBool::new(true),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn icon(&self) -> &'static str {
        self.icon
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Relaxed)
    }

    fn detach(&self) {
        self.attached.store(false, Ordering::Relaxed);
    }

    pub fn text(&self) -> String {
        self.text
            .lock()
            .map(|text| text.clone())
            .unwrap_or_default()
    }
}

impl Listener for PanelListener {
    fn handle(&self, value: &PropertyValue) -> Result<(), ListenerError> {
        if !self.is_attached() {
            return Err(ListenerError::Detached);
        }
        if value.is_err() {
            self.set_active(false);
        }

        let mut text = self
            .text
            .lock()
            .map_err(|_| ListenerError::Rejected(format!("{} display is poisoned", self.label)))?;
        *text = value.to_string();
        Ok(())
    }
}

/// Owns the listeners of the current property set; the processor only
/// holds weak handles to them.
#[derive(Default)]
pub struct DisplayManager {
    /// Indexed by property slot
    listeners: Vec<Option<Arc<PanelListener>>>,
}

impl DisplayManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the listener for the next slot.
    pub fn attach(&mut self, property: &Property, active: bool) -> Arc<PanelListener> {
        let listener = Arc::new(PanelListener::new(property));
        listener.set_active(active);
        self.listeners.push(Some(listener.clone()));
        listener
    }

    /// Drop the listener of `slot`. The processor stops broadcasting to it
    /// on the next tick; a handle kept elsewhere refuses further values.
    pub fn remove(&mut self, slot: usize) -> Option<Arc<PanelListener>> {
        let listener = self.listeners.get_mut(slot).and_then(Option::take)?;
        listener.detach();
        Some(listener)
    }

    pub fn get(&self, slot: usize) -> Option<&Arc<PanelListener>> {
        self.listeners.get(slot).and_then(Option::as_ref)
    }

    pub fn clear(&mut self) {
        for listener in self.listeners.drain(..).flatten() {
            listener.detach();
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn active_count(&self) -> usize {
        self.listeners
            .iter()
            .flatten()
            .filter(|listener| listener.is_active())
            .count()
    }

    /// The group is shown while at least one listener is active.
    pub fn is_visible(&self) -> bool {
        self.active_count() > 0
    }

    /// One `label: value` line per active listener, in slot order.
    pub fn render(&self) -> Vec<String> {
        self.listeners
            .iter()
            .flatten()
            .filter(|listener| listener.is_active())
            .map(|listener| format!("{}: {}", listener.label(), listener.text()))
            .collect()
    }
}
