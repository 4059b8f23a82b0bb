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

// Command execution for the vendor tools.
//
// Every call spawns exactly one process. There is no retry and no timeout:
// a hung tool stalls the caller until it exits or is killed externally.

use crate::device::common::{DeviceError, DeviceResult};
use crate::device::platform_detection::find_program_in_path;
use std::io;
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Raw text produced by one tool invocation, or the `ERROR` sentinel as `Err`.
pub type RawSample = DeviceResult<String>;

/// Completion callback for asynchronous invocations.
pub type Completion = Box<dyn FnOnce(RawSample) + Send + 'static>;

/// Options to control command execution behavior.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// If true, non-zero exit statuses will return an error.
    pub check_status: bool,
}

/// Normalized command output.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit code (or -1 if unavailable)
    pub status: i32,
    /// UTF-8 decoded stdout
    pub stdout: String,
    /// UTF-8 (lossy) decoded stderr
    pub stderr: String,
}

/// Execute a command with the provided CommandOptions.
///
/// - A missing executable maps to DeviceError::ToolMissing
/// - Stdout that is not valid UTF-8 maps to DeviceError::Decode
/// - When options.check_status is true and exit code != 0, returns DeviceError::CommandFailed
pub fn execute_command(
    command: &str,
    args: &[&str],
    options: &CommandOptions,
) -> DeviceResult<CommandOutput> {
    let output = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| spawn_error(command, e))?;

    let full_command = format!("{command} {}", args.join(" "));
    let status_code = output.status.code().unwrap_or(-1);
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if options.check_status && status_code != 0 {
        return Err(DeviceError::CommandFailed {
            command: full_command,
            code: Some(status_code),
            stderr,
        });
    }

    let stdout = String::from_utf8(output.stdout).map_err(|_| DeviceError::Decode(full_command))?;

    Ok(CommandOutput {
        status: status_code,
        stdout,
        stderr,
    })
}

/// Start a command with all standard streams on `/dev/null` and return as
/// soon as it is running. The child is reaped on a background thread.
pub fn spawn_detached(command: &str, args: &[&str]) -> DeviceResult<()> {
    let mut child = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| spawn_error(command, e))?;

    let command = command.to_string();
    thread::spawn(move || match child.wait() {
        Ok(status) => debug!("{command} exited with {status}"),
        Err(e) => debug!("waiting for {command} failed: {e}"),
    });
    Ok(())
}

fn spawn_error(command: &str, e: io::Error) -> DeviceError {
    match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            DeviceError::ToolMissing(command.to_string())
        }
        _ => DeviceError::Io(e),
    }
}

/// Split a command line on whitespace into program and arguments.
/// The tool invocations used here never need shell quoting.
pub fn split_command_line(command_line: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = command_line.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}

/// Abstraction over process spawning so providers can be driven by canned
/// output in tests.
pub trait CommandRunner: Send + Sync {
    /// Run a command line to completion and return its stdout.
    fn run(&self, command_line: &str) -> RawSample;

    /// Run a command line on a background thread and hand the result to
    /// `on_complete`. Never blocks the caller.
    fn run_async(&self, command_line: &str, on_complete: Completion);

    /// Start a long-lived program (a GUI) whose output nobody reads.
    /// Returns once it is running.
    fn launch(&self, command_line: &str) -> DeviceResult<()>;

    /// Whether `program` can be found on PATH.
    fn find_program(&self, program: &str) -> bool;
}

/// The process-backed runner.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spawner;

impl Spawner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for Spawner {
    fn run(&self, command_line: &str) -> RawSample {
        let (program, args) = split_command_line(command_line)
            .ok_or_else(|| DeviceError::ParseError("empty command line".to_string()))?;

        let options = CommandOptions { check_status: true };
        match execute_command(program, &args, &options) {
            Ok(output) => Ok(output.stdout),
            Err(e) => {
                debug!("'{command_line}' failed: {e}");
                Err(e)
            }
        }
    }

    fn run_async(&self, command_line: &str, on_complete: Completion) {
        let runner = *self;
        let command_line = command_line.to_string();
        thread::spawn(move || {
            let result = runner.run(&command_line);
            on_complete(result);
        });
    }

    fn launch(&self, command_line: &str) -> DeviceResult<()> {
        let (program, args) = split_command_line(command_line)
            .ok_or_else(|| DeviceError::ParseError("empty command line".to_string()))?;
        spawn_detached(program, &args)
    }

    fn find_program(&self, program: &str) -> bool {
        find_program_in_path(program).is_some()
    }
}
