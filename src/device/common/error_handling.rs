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

// Error types and result aliases for tool invocation and output parsing.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum DeviceError {
    Io(io::Error),
    /// The executable is not on PATH or could not be started.
    ToolMissing(String),
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    /// Stdout was not valid UTF-8.
    Decode(String),
    /// The tool reported a library/driver version mismatch.
    DriverMismatch(String),
    ParseError(String),
    /// The metric is not available from this tool on this GPU.
    Unsupported(String),
}

pub type DeviceResult<T> = Result<T, DeviceError>;

impl DeviceError {
    /// Missing tools and driver mismatches are not worth retrying this session.
    pub fn is_tool_unavailable(&self) -> bool {
        matches!(
            self,
            DeviceError::ToolMissing(_) | DeviceError::DriverMismatch(_)
        )
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Io(e) => write!(f, "IO error: {e}"),
            DeviceError::ToolMissing(program) => write!(f, "Tool not found: {program}"),
            DeviceError::CommandFailed {
                command,
                code,
                stderr,
            } => {
                write!(
                    f,
                    "Command failed: '{command}' (code: {code:?}) stderr: {stderr}"
                )
            }
            DeviceError::Decode(command) => write!(f, "Output of '{command}' is not valid UTF-8"),
            DeviceError::DriverMismatch(msg) => write!(f, "Driver mismatch: {msg}"),
            DeviceError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            DeviceError::Unsupported(msg) => write!(f, "Unsupported: {msg}"),
        }
    }
}

impl std::error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeviceError::Io(e) => Some(e),
            _ => None,
        }
    }
}

// io::Error is not Clone; cached failures are replayed with the same kind and message.
impl Clone for DeviceError {
    fn clone(&self) -> Self {
        match self {
            DeviceError::Io(e) => DeviceError::Io(io::Error::new(e.kind(), e.to_string())),
            DeviceError::ToolMissing(program) => DeviceError::ToolMissing(program.clone()),
            DeviceError::CommandFailed {
                command,
                code,
                stderr,
            } => DeviceError::CommandFailed {
                command: command.clone(),
                code: *code,
                stderr: stderr.clone(),
            },
            DeviceError::Decode(command) => DeviceError::Decode(command.clone()),
            DeviceError::DriverMismatch(msg) => DeviceError::DriverMismatch(msg.clone()),
            DeviceError::ParseError(msg) => DeviceError::ParseError(msg.clone()),
            DeviceError::Unsupported(msg) => DeviceError::Unsupported(msg.clone()),
        }
    }
}

impl From<io::Error> for DeviceError {
    fn from(value: io::Error) -> Self {
        DeviceError::Io(value)
    }
}
