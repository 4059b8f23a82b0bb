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

// Tool names, command lines and output layout constants

/// Executables
pub const NVIDIA_SMI: &str = "nvidia-smi";
pub const NVIDIA_SETTINGS: &str = "nvidia-settings";
pub const OPTIRUN: &str = "optirun";

/// nvidia-smi discovery query
pub const SMI_GPU_NAMES_ARGS: &str = "--query-gpu=gpu_name --format=csv,noheader";

/// nvidia-settings discovery query
pub const SETTINGS_GPU_NAMES_ARGS: &str = "-q gpus";

/// Native settings launch under Bumblebee: no bridge, second X display
pub const OPTIMUS_SETTINGS_ARGS: &str = "-b none nvidia-settings -c :8";

/// nvidia-settings attribute names
pub const ATTR_UTILIZATION: &str = "GPUUtilization";
pub const ATTR_CORE_TEMP: &str = "GPUCoreTemp";
pub const ATTR_USED_MEMORY: &str = "UsedDedicatedGPUMemory";
pub const ATTR_TOTAL_MEMORY: &str = "TotalDedicatedGPUMemory";
pub const ATTR_FAN_SPEED: &str = "GPUCurrentFanSpeed";

/// Key of the graphics engine inside GPUUtilization output
pub const UTILIZATION_GRAPHICS_KEY: &str = "graphics";

/// Plain `nvidia-smi` table layout: the first GPU's value row is the 9th
/// output line, and every further GPU adds a name row, a value row and a
/// separator.
pub const SMI_FIRST_VALUE_LINE: usize = 8;
pub const SMI_LINES_PER_GPU: usize = 3;

/// Minimum digit runs in a well-formed value row
pub const SMI_MIN_TOKENS: usize = 8;

/// Token positions inside a value row:
/// `| 27%   37C    P8    10W / 180W |    512MiB /  8192MiB |      3%      Default |`
pub mod smi_row {
    pub const FAN: usize = 0;
    pub const TEMPERATURE: usize = 1;
    pub const PERFORMANCE_STATE: usize = 2;
    pub const POWER_DRAW: usize = 3;
    pub const POWER_CAP: usize = 4;
    pub const USED_MEMORY: usize = 5;
    pub const TOTAL_MEMORY: usize = 6;
    pub const UTILIZATION: usize = 7;
}

/// Substrings that mark unusable nvidia-smi output
pub const SMI_ERROR_MARKER: &str = "ERROR";
pub const SMI_DRIVER_MISMATCH_MARKER: &str = "libnvidia-ml.so";

/// Temperature conversion
pub const FAHRENHEIT_OFFSET: f64 = 32.0;
pub const FAHRENHEIT_SCALE: f64 = 9.0 / 5.0;

/// Display suffixes
pub const DEGREE_SIGN: char = '\u{B0}';
pub const PERCENTAGE_SUFFIX: char = '%';
pub const POWER_SUFFIX_W: char = 'W';
pub const MEMORY_SUFFIX_MIB: &str = "MiB";
pub const RPM_SUFFIX: &str = "RPM";
