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

// Telemetry providers: one per tool or tool combination

pub mod combined;
pub mod optimus;
pub mod settings;
pub mod smi;

use std::collections::HashMap;

use crate::device::common::{CommandRunner, DeviceResult, RawSample};
use crate::device::property::Property;
use crate::device::types::{DataSource, MetricKind, Reading, Unit};
use crate::ui::notification::NotificationManager;

pub use combined::CombinedProvider;
pub use optimus::OptimusProvider;
pub use settings::SettingsProvider;
pub use smi::SmiProvider;

/// A strategy for discovering GPUs and reading their metrics through one
/// vendor tool or a combination of them.
///
/// `properties` and `retrieve_properties` return the same ordered sequence
/// for the lifetime of one provider; slot positions index the persisted
/// active/inactive flags.
pub trait Provider: Send {
    /// Short name used in logs and notifications.
    fn name(&self) -> &'static str;

    /// Discover GPUs as `"<index>: <name>"` labels. The list carries one
    /// trailing entry, so the GPU count is `labels.len() - 1`.
    fn gpu_names(&mut self) -> DeviceResult<Vec<String>>;

    /// Build one property per (metric kind × GPU), kind-major, and store them.
    fn properties(&mut self, gpu_count: usize) -> Vec<Property>;

    /// The sequence built by the last `properties` call.
    fn retrieve_properties(&self) -> &[Property];

    /// Switch the stored temperature properties to `unit`.
    fn set_temperature_unit(&mut self, unit: Unit) -> DeviceResult<()>;

    /// Whether a native configuration tool exists for this provider.
    fn has_settings(&self) -> bool;

    /// Launch the native configuration tool without waiting for it, or
    /// post an error notification when this provider has none.
    fn open_settings(&self, notifications: &mut NotificationManager);

    /// Read the current value of `property`, reusing this tick's samples.
    fn read(&self, property: &Property, cache: &mut SampleCache<'_>) -> DeviceResult<Reading>;

    /// The runner every tool invocation goes through.
    fn runner(&self) -> &dyn CommandRunner;
}

/// Memoizes tool output for the duration of one tick, so properties that
/// share a command line share a single process spawn.
pub struct SampleCache<'a> {
    runner: &'a dyn CommandRunner,
    samples: HashMap<String, RawSample>,
}

impl<'a> SampleCache<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            samples: HashMap::new(),
        }
    }

    /// Run `command_line` unless this tick already has its output.
    pub fn run(&mut self, command_line: &str) -> RawSample {
        if let Some(sample) = self.samples.get(command_line) {
            return sample.clone();
        }

        let sample = self.runner.run(command_line);
        self.samples
            .insert(command_line.to_string(), sample.clone());
        sample
    }

    /// Number of distinct command lines run this tick.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Build a command line, optionally wrapped by a launcher such as `optirun`.
pub(crate) fn command_line(launcher: Option<&str>, program: &str, args: &str) -> String {
    match launcher {
        Some(launcher) => format!("{launcher} {program} {args}"),
        None => format!("{program} {args}"),
    }
    .trim_end()
    .to_string()
}

/// Switch every temperature property among `properties` to `unit`.
pub(crate) fn apply_temperature_unit<'a>(
    properties: impl IntoIterator<Item = &'a mut Property>,
    unit: Unit,
) -> DeviceResult<()> {
    properties
        .into_iter()
        .filter(|property| property.kind() == MetricKind::Temperature)
        .try_for_each(|property| property.set_unit(unit))
}

/// Kind-major property list: every GPU's utilization, then every GPU's
/// temperature, and so on.
pub(crate) fn build_properties(
    kinds: &[MetricKind],
    gpu_count: usize,
    source: DataSource,
) -> Vec<Property> {
    kinds
        .iter()
        .flat_map(|&kind| (0..gpu_count).map(move |gpu| Property::new(kind, gpu, source)))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use crate::device::common::command_executor::Completion;
    use crate::device::common::{CommandRunner, DeviceError, DeviceResult, RawSample};

    /// Canned-output runner that records every invocation.
    #[derive(Default)]
    pub struct FakeRunner {
        pub outputs: Mutex<HashMap<String, String>>,
        pub programs: Vec<String>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_program(mut self, program: &str) -> Self {
            self.programs.push(program.to_string());
            self
        }

        pub fn with_output(self, command_line: &str, output: &str) -> Self {
            self.outputs
                .lock()
                .unwrap()
                .insert(command_line.to_string(), output.to_string());
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn clear_calls(&self) {
            self.calls.lock().unwrap().clear();
        }

        pub fn into_arc(self) -> Arc<FakeRunner> {
            Arc::new(self)
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, command_line: &str) -> RawSample {
            self.calls.lock().unwrap().push(command_line.to_string());
            let program = command_line.split_whitespace().next().unwrap_or_default();
            if !self.programs.iter().any(|p| p == program) {
                return Err(DeviceError::ToolMissing(program.to_string()));
            }
            self.outputs
                .lock()
                .unwrap()
                .get(command_line)
                .cloned()
                .ok_or_else(|| DeviceError::CommandFailed {
                    command: command_line.to_string(),
                    code: Some(1),
                    stderr: String::new(),
                })
        }

        fn run_async(&self, command_line: &str, on_complete: Completion) {
            on_complete(self.run(command_line));
        }

        fn launch(&self, command_line: &str) -> DeviceResult<()> {
            self.calls.lock().unwrap().push(command_line.to_string());
            let program = command_line.split_whitespace().next().unwrap_or_default();
            if self.find_program(program) {
                Ok(())
            } else {
                Err(DeviceError::ToolMissing(program.to_string()))
            }
        }

        fn find_program(&self, program: &str) -> bool {
            self.programs.iter().any(|p| p == program)
        }
    }

    /// Eight-line header followed by one name row, value row and separator per GPU.
    pub fn smi_table(rows: &[&str]) -> String {
        let mut lines: Vec<String> = vec![
            "Mon Oct 19 10:00:00 2026".to_string(),
            "+-----------------------------------------------------------------------------+".to_string(),
            "| NVIDIA-SMI 390.48                 Driver Version: 390.48                    |".to_string(),
            "|-------------------------------+----------------------+----------------------+".to_string(),
            "| GPU  Name        Persistence-M| Bus-Id        Disp.A | Volatile Uncorr. ECC |".to_string(),
            "| Fan  Temp  Perf  Pwr:Usage/Cap|         Memory-Usage | GPU-Util  Compute M. |".to_string(),
            "|===============================+======================+======================|".to_string(),
        ];
        for (i, row) in rows.iter().enumerate() {
            lines.push(format!(
                "|   {i}  GeForce GTX 1080    Off  | 00000000:0{i}:00.0  On |                  N/A |"
            ));
            lines.push(row.to_string());
            lines.push(
                "+-------------------------------+----------------------+----------------------+"
                    .to_string(),
            );
        }
        lines.push(String::new());
        lines.join("\n")
    }
}
