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

//! Integration tests for the public library API.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{settings_gpus, smi_row, smi_table, FakeRunner, SETTINGS_GPUS, SMI_NAMES};
use nvidia_util::view::TickFn;
use nvidia_util::{
    AppContext, Error, Listener, ListenerError, PollScheduler, ProcessorHandler, Property,
    PropertyValue, ProviderKind, Settings, TemperatureUnit,
};

fn smi_settings() -> Settings {
    Settings {
        provider: ProviderKind::Smi,
        ..Settings::default()
    }
}

fn two_gpu_runner() -> Arc<FakeRunner> {
    let runner = FakeRunner::new();
    runner.install("nvidia-smi");
    runner.respond(SMI_NAMES, "GeForce GTX 1080\nQuadro P400\n");
    let rows = [
        smi_row(30, 65, 120, 3000, 8000, 77),
        smi_row(40, 70, 200, 1000, 8000, 12),
    ];
    runner.respond(
        "nvidia-smi",
        &smi_table(&[rows[0].as_str(), rows[1].as_str()]),
    );
    runner
}

#[test]
fn test_reload_from_two_gpus_to_one() {
    let runner = two_gpu_runner();
    let mut ctx = AppContext::with_runner(smi_settings(), runner.clone()).unwrap();
    assert_eq!(ctx.gpu_count(), 2);
    assert_eq!(ctx.handler().len(), 10);

    let old_listener = ctx.display().get(9).cloned().unwrap();

    runner.respond(SMI_NAMES, "GeForce GTX 1080\n");
    ctx.reload().unwrap();

    assert_eq!(ctx.gpu_count(), 1);
    assert_eq!(ctx.handler().len(), 5);
    assert_eq!(ctx.display().len(), 5);
    assert!(ctx.handler().properties().all(|p| p.gpu_index() == 0));

    // Registrations from before the reload are gone
    ctx.tick();
    assert_eq!(old_listener.text(), "");
    assert_eq!(Arc::strong_count(&old_listener), 1);
}

#[test]
fn test_failing_gpu_does_not_block_others() {
    let runner = two_gpu_runner();
    // GPU 1's row is missing from the table
    let row = smi_row(30, 65, 120, 3000, 8000, 77);
    runner.respond("nvidia-smi", &smi_table(&[row.as_str()]));

    let mut ctx = AppContext::with_runner(smi_settings(), runner).unwrap();
    let summary = ctx.tick();
    assert_eq!(summary.polled, 10);
    assert_eq!(summary.retired, 5);

    let rendered = ctx.display().render();
    assert_eq!(rendered.len(), 5);
    assert!(rendered.contains(&"GPU 0 Temperature: 65\u{B0}C".to_string()));

    assert_eq!(ctx.tick().polled, 5);
}

#[test]
fn test_unit_switch_keeps_retired_properties_retired() {
    let runner = two_gpu_runner();
    let row = smi_row(30, 65, 120, 3000, 8000, 77);
    runner.respond("nvidia-smi", &smi_table(&[row.as_str()]));

    let mut ctx = AppContext::with_runner(smi_settings(), runner).unwrap();
    assert_eq!(ctx.tick().retired, 5);

    ctx.set_temperature_unit(TemperatureUnit::Fahrenheit);
    assert_eq!(ctx.tick().polled, 5);
    assert_eq!(ctx.handler().live_count(), 5);
    assert_eq!(ctx.display().get(2).unwrap().text(), "149\u{B0}F");

    let live: Vec<Property> = ctx.handler().properties().cloned().collect();
    assert_eq!(ctx.provider().unwrap().retrieve_properties(), live.as_slice());
}

#[test]
fn test_failed_reload_keeps_notification() {
    let runner = two_gpu_runner();
    let mut ctx = AppContext::with_runner(smi_settings(), runner.clone()).unwrap();

    runner.uninstall("nvidia-smi");
    let err = ctx.reload().unwrap_err();
    assert!(matches!(err, Error::Discovery(_)));
    assert!(ctx.handler().is_empty());
    assert_eq!(
        ctx.notifications_mut().get_current_message(),
        Some("Could not list GPUs")
    );
    assert!(err.to_string().starts_with("Could not list GPUs: "));
}

#[test]
fn test_settings_routing_without_restart() {
    let runner = FakeRunner::new();
    runner.install("nvidia-smi");
    runner.install("nvidia-settings");
    runner.respond(SMI_NAMES, "GeForce GTX 1080\n");
    runner.respond(SETTINGS_GPUS, &settings_gpus(&["GeForce GTX 1080"]));
    let row = smi_row(30, 65, 120, 3000, 8000, 77);
    runner.respond("nvidia-smi", &smi_table(&[row.as_str()]));
    runner.respond("nvidia-settings -q [gpu:0]/GPUCoreTemp -t", "66\n");

    let mut ctx = AppContext::with_runner(Settings::default(), runner.clone()).unwrap();
    assert_eq!(ctx.provider().map(|p| p.name()), Some("combined"));
    assert_eq!(ctx.handler().len(), 5);

    // nvidia-smi disappears; the next reload goes through nvidia-settings
    runner.uninstall("nvidia-smi");
    ctx.reload().unwrap();
    assert_eq!(ctx.handler().len(), 4);

    runner.clear_calls();
    ctx.tick();
    assert!(runner
        .calls()
        .iter()
        .all(|c| c.starts_with("nvidia-settings")));
    assert_eq!(ctx.display().get(1).unwrap().text(), "66\u{B0}C");
}

#[test]
fn test_no_tools_reports_error() {
    let runner = FakeRunner::new();
    let result = AppContext::with_runner(Settings::default(), runner);
    assert!(matches!(result, Err(Error::NoToolsFound)));
}

#[test]
fn test_toggled_settings_persist_across_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let mut settings = smi_settings();
    settings.toggle(0);
    settings.toggle(4);
    settings.save(&path).unwrap();

    let loaded = Settings::load(&path).unwrap();
    let ctx = AppContext::with_runner(loaded, two_gpu_runner()).unwrap();
    assert_eq!(ctx.display().len(), 10);
    assert_eq!(ctx.handler().len(), 8);
    assert_eq!(ctx.display().active_count(), 8);
}

struct Counting {
    values: Mutex<Vec<PropertyValue>>,
}

impl Listener for Counting {
    fn handle(&self, value: &PropertyValue) -> Result<(), ListenerError> {
        self.values
            .lock()
            .map_err(|_| ListenerError::Detached)?
            .push(value.clone());
        Ok(())
    }
}

#[test]
fn test_weak_listeners() {
    let runner = two_gpu_runner();
    let ctx = AppContext::with_runner(smi_settings(), runner.clone()).unwrap();
    let provider = ctx.provider().unwrap();

    let mut handler = ProcessorHandler::new();
    let listener = Arc::new(Counting {
        values: Mutex::new(Vec::new()),
    });
    let as_dyn: Arc<dyn Listener> = listener.clone();
    handler.add_property(provider.retrieve_properties()[0].clone(), &[as_dyn]);

    handler.process(provider);
    assert_eq!(listener.values.lock().unwrap().len(), 1);
    assert_eq!(handler.listener_count(0), 1);

    drop(listener);
    assert_eq!(handler.listener_count(0), 0);
    assert_eq!(handler.process(provider).listener_errors, 0);
}

#[tokio::test]
async fn test_scheduler_drives_context() {
    let runner = two_gpu_runner();
    let ctx = Arc::new(Mutex::new(
        AppContext::with_runner(smi_settings(), runner.clone()).unwrap(),
    ));

    let tick_ctx = ctx.clone();
    let tick: TickFn = Arc::new(move || {
        if let Ok(mut ctx) = tick_ctx.lock() {
            ctx.tick();
        }
    });

    let mut scheduler = PollScheduler::new();
    scheduler.start(Duration::from_millis(10), tick).await;
    tokio::time::sleep(Duration::from_millis(80)).await;
    scheduler.stop().await;

    let ticks = runner.count("nvidia-smi");
    assert!(ticks >= 2, "expected several ticks, saw {ticks}");

    ctx.lock().unwrap().teardown();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(runner.count("nvidia-smi"), ticks);
    assert_eq!(
        ctx.lock().unwrap().display().get(0).map(|l| l.text()),
        None
    );
}
