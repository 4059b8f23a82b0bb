// Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use nvidia_util::device::common::command_executor::Completion;
use nvidia_util::{CommandRunner, DeviceError, DeviceResult, RawSample};

pub const SMI_NAMES: &str = "nvidia-smi --query-gpu=gpu_name --format=csv,noheader";
pub const SETTINGS_GPUS: &str = "nvidia-settings -q gpus";

/// Runner that answers from a table of canned outputs.
#[derive(Default)]
pub struct FakeRunner {
    programs: Mutex<Vec<String>>,
    outputs: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn install(&self, program: &str) {
        self.programs.lock().unwrap().push(program.to_string());
    }

    pub fn uninstall(&self, program: &str) {
        self.programs.lock().unwrap().retain(|p| p != program);
    }

    pub fn respond(&self, command_line: &str, output: &str) {
        self.outputs
            .lock()
            .unwrap()
            .insert(command_line.to_string(), output.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, command_line: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| *c == command_line)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, command_line: &str) -> RawSample {
        self.calls.lock().unwrap().push(command_line.to_string());
        let program = command_line.split_whitespace().next().unwrap_or_default();
        if !self.find_program(program) {
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
                stderr: "no canned output".to_string(),
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
        self.programs.lock().unwrap().iter().any(|p| p == program)
    }
}

/// Plain nvidia-smi output with one value row per entry of `rows`.
pub fn smi_table(rows: &[&str]) -> String {
    let mut out = String::from(
        "Mon Oct 19 10:00:00 2026\n\
+-----------------------------------------------------------------------------+\n\
| NVIDIA-SMI 390.48                 Driver Version: 390.48                    |\n\
|-------------------------------+----------------------+----------------------+\n\
| GPU  Name        Persistence-M| Bus-Id        Disp.A | Volatile Uncorr. ECC |\n\
| Fan  Temp  Perf  Pwr:Usage/Cap|         Memory-Usage | GPU-Util  Compute M. |\n\
|===============================+======================+======================|\n",
    );
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "|   {i}  GeForce GTX 1080    Off  | 00000000:0{i}:00.0  On |                  N/A |\n"
        ));
        out.push_str(row);
        out.push('\n');
        out.push_str(
            "+-------------------------------+----------------------+----------------------+\n",
        );
    }
    out
}

pub fn smi_row(fan: u32, temp: u32, power: u32, used: u32, total: u32, util: u32) -> String {
    format!(
        "| {fan:>3}%   {temp}C    P2   {power:>3}W / 250W |  {used:>5}MiB / {total:>5}MiB |    {util:>3}%      Default |"
    )
}

pub fn settings_gpus(names: &[&str]) -> String {
    let mut out = format!("\n{} GPUs on desktop:0\n\n", names.len());
    for (i, name) in names.iter().enumerate() {
        out.push_str(&format!("    [{i}] desktop:0[gpu:{i}] ({name})\n\n"));
    }
    out
}
