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

// Parsers for nvidia-smi and nvidia-settings text output

use once_cell::sync::Lazy;
use regex::Regex;

use crate::device::common::constants::{
    smi_row, SMI_DRIVER_MISMATCH_MARKER, SMI_ERROR_MARKER, SMI_FIRST_VALUE_LINE,
    SMI_LINES_PER_GPU, SMI_MIN_TOKENS, UTILIZATION_GRAPHICS_KEY,
};
use crate::device::common::{DeviceError, DeviceResult};

/// `[0] host:0[gpu:0] (GeForce GTX 1080)`
static SETTINGS_GPU_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[gpu:(\d+)\]\s*\(([^)]*)\)").expect("valid GPU line regex"));

/// Split a line into runs of ASCII digits.
///
/// A run is closed by the first non-digit character that follows it, so a
/// run touching the end of the line is not emitted. Table rows always end in
/// `|`, which keeps this from mattering for real output.
pub fn tokenize_digit_runs(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut buffer = String::new();
    let mut in_run = false;

    for c in line.chars() {
        if c.is_ascii_digit() {
            in_run = true;
            buffer.push(c);
        } else if in_run {
            tokens.push(std::mem::take(&mut buffer));
            in_run = false;
        }
    }

    tokens
}

/// Values extracted from one GPU's row of the plain `nvidia-smi` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmiRow {
    pub fan: u64,
    pub temperature: u64,
    pub power_draw: u64,
    pub used_memory: u64,
    pub total_memory: u64,
    pub utilization: u64,
}

/// Parse one value row. Fewer than eight digit runs means the table layout
/// is not the one we know, which fails the whole row.
pub fn parse_smi_row(line: &str) -> DeviceResult<SmiRow> {
    let tokens = tokenize_digit_runs(line);
    if tokens.len() < SMI_MIN_TOKENS {
        return Err(DeviceError::ParseError(format!(
            "expected at least {SMI_MIN_TOKENS} numbers in nvidia-smi row, found {}: '{}'",
            tokens.len(),
            line.trim()
        )));
    }

    let number = |index: usize| -> DeviceResult<u64> {
        tokens[index].parse::<u64>().map_err(|e| {
            DeviceError::ParseError(format!("bad number '{}' in nvidia-smi row: {e}", tokens[index]))
        })
    };

    Ok(SmiRow {
        fan: number(smi_row::FAN)?,
        temperature: number(smi_row::TEMPERATURE)?,
        power_draw: number(smi_row::POWER_DRAW)?,
        used_memory: number(smi_row::USED_MEMORY)?,
        total_memory: number(smi_row::TOTAL_MEMORY)?,
        utilization: number(smi_row::UTILIZATION)?,
    })
}

/// Pick the value row of `gpu_index` out of the full `nvidia-smi` output.
pub fn smi_value_line(output: &str, gpu_index: usize) -> DeviceResult<&str> {
    let line_number = SMI_FIRST_VALUE_LINE + gpu_index * SMI_LINES_PER_GPU;
    output.split('\n').nth(line_number).ok_or_else(|| {
        DeviceError::ParseError(format!(
            "nvidia-smi output has no line {line_number} for GPU {gpu_index}"
        ))
    })
}

/// Reject nvidia-smi output that reports an error or a driver mismatch.
pub fn check_smi_output(output: &str) -> DeviceResult<()> {
    if output.contains(SMI_DRIVER_MISMATCH_MARKER) {
        return Err(DeviceError::DriverMismatch(output.trim().to_string()));
    }
    if output.contains(SMI_ERROR_MARKER) {
        return Err(DeviceError::ParseError(format!(
            "nvidia-smi reported an error: {}",
            output.trim()
        )));
    }
    Ok(())
}

/// Memory usage as a display percentage.
///
/// The percentage is rendered in full and then cut to its first two
/// characters, so 33.33 shows as `33` and 100 shows as `10`. A dangling
/// decimal point (`5.` from 5.8) is dropped.
pub fn memory_percentage(used: u64, total: u64) -> DeviceResult<String> {
    if total == 0 {
        return Err(DeviceError::ParseError(
            "total memory reported as zero".to_string(),
        ));
    }

    let percentage = used as f64 / total as f64 * 100.0;
    let rendered = format!("{percentage}");
    let truncated: String = rendered.chars().take(2).collect();

    Ok(truncated.trim_end_matches('.').to_string())
}

/// Parse `graphics=5, memory=3, video=0, PCIe=0` and return the graphics load.
pub fn parse_settings_utilization(output: &str) -> DeviceResult<u64> {
    let line = output.lines().next().unwrap_or_default();

    line.split(',')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == UTILIZATION_GRAPHICS_KEY)
        .ok_or_else(|| {
            DeviceError::ParseError(format!("no graphics utilization in '{}'", line.trim()))
        })
        .and_then(|(_, value)| parse_leading_number(value))
}

/// Parse the number on the first line of terse nvidia-settings output.
pub fn parse_first_line_number(output: &str) -> DeviceResult<u64> {
    let line = output.lines().next().unwrap_or_default();
    parse_leading_number(line)
}

fn parse_leading_number(text: &str) -> DeviceResult<u64> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits
        .parse::<u64>()
        .map_err(|e| DeviceError::ParseError(format!("Failed to parse number from '{text}': {e}")))
}

/// Extract `(index, name)` pairs from `nvidia-settings -q gpus`.
pub fn parse_settings_gpus(output: &str) -> Vec<(usize, String)> {
    let mut gpus: Vec<(usize, String)> = SETTINGS_GPU_LINE
        .captures_iter(output)
        .filter_map(|caps| {
            let index = caps.get(1)?.as_str().parse::<usize>().ok()?;
            let name = caps.get(2)?.as_str().trim().to_string();
            Some((index, name))
        })
        .collect();

    gpus.sort_by_key(|(index, _)| *index);
    gpus.dedup_by_key(|(index, _)| *index);
    gpus
}

/// Turn newline-terminated GPU names into `"<index>: <name>"` labels.
///
/// The trailing newline yields one extra, empty-named label, so the GPU
/// count is always `labels.len() - 1` (see [`gpu_count`]).
pub fn label_gpu_names(text: &str) -> Vec<String> {
    text.split('\n')
        .enumerate()
        .map(|(i, name)| format!("{i}: {name}"))
        .collect()
}

/// Number of GPUs described by a label list from [`label_gpu_names`].
pub fn gpu_count(labels: &[String]) -> usize {
    labels.len().saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str =
        "| 27%   37C    P8    10W / 180W |    512MiB /  8192MiB |      3%      Default |";

    #[test]
    fn test_tokenize_digit_runs() {
        assert_eq!(
            tokenize_digit_runs(ROW),
            vec!["27", "37", "8", "10", "180", "512", "8192", "3"]
        );
    }

    #[test]
    fn test_tokenize_drops_unterminated_run() {
        assert_eq!(tokenize_digit_runs("12 34"), vec!["12"]);
        assert!(tokenize_digit_runs("no digits").is_empty());
    }

    #[test]
    fn test_parse_smi_row() {
        let row = parse_smi_row(ROW).unwrap();
        assert_eq!(row.fan, 27);
        assert_eq!(row.temperature, 37);
        assert_eq!(row.power_draw, 10);
        assert_eq!(row.used_memory, 512);
        assert_eq!(row.total_memory, 8192);
        assert_eq!(row.utilization, 3);
    }

    #[test]
    fn test_parse_smi_row_too_few_tokens() {
        let row = "| N/A   37C    P8    N/A /  N/A |    512MiB /  8192MiB |      3%      Default |";
        assert!(matches!(
            parse_smi_row(row),
            Err(DeviceError::ParseError(_))
        ));
        assert!(parse_smi_row("").is_err());
    }

    #[test]
    fn test_memory_percentage() {
        assert_eq!(memory_percentage(512, 2048).unwrap(), "25");
        assert_eq!(memory_percentage(1, 3).unwrap(), "33");
        assert_eq!(memory_percentage(2048, 2048).unwrap(), "10");
        assert_eq!(memory_percentage(58, 1000).unwrap(), "5");
        assert_eq!(memory_percentage(0, 1000).unwrap(), "0");
        assert!(memory_percentage(1, 0).is_err());
    }

    #[test]
    fn test_check_smi_output() {
        assert!(check_smi_output("GeForce GTX 1080\n").is_ok());
        assert!(matches!(
            check_smi_output("NVIDIA-SMI has failed because it couldn't communicate with libnvidia-ml.so"),
            Err(DeviceError::DriverMismatch(_))
        ));
        assert!(check_smi_output("ERROR: something").is_err());
    }

    #[test]
    fn test_parse_settings_utilization() {
        assert_eq!(
            parse_settings_utilization("graphics=45, memory=12, video=0, PCIe=1\n").unwrap(),
            45
        );
        assert!(parse_settings_utilization("memory=12\n").is_err());
        assert!(parse_settings_utilization("").is_err());
    }

    #[test]
    fn test_parse_first_line_number() {
        assert_eq!(parse_first_line_number("52\n48\n").unwrap(), 52);
        assert_eq!(parse_first_line_number("  8192\n").unwrap(), 8192);
        assert!(parse_first_line_number("n/a").is_err());
    }

    #[test]
    fn test_parse_settings_gpus() {
        let output = "\n2 GPUs on desktop:0\n\n    [0] desktop:0[gpu:0] (GeForce GTX 1080)\n\n    [1] desktop:0[gpu:1] (Quadro P400)\n\n";
        assert_eq!(
            parse_settings_gpus(output),
            vec![
                (0, "GeForce GTX 1080".to_string()),
                (1, "Quadro P400".to_string())
            ]
        );
        assert!(parse_settings_gpus("no gpus here").is_empty());
    }

    #[test]
    fn test_label_gpu_names_keeps_trailing_entry() {
        let labels = label_gpu_names("GeForce GTX 1080\nQuadro P400\n");
        assert_eq!(labels, vec!["0: GeForce GTX 1080", "1: Quadro P400", "2: "]);
        assert_eq!(gpu_count(&labels), 2);
        assert_eq!(gpu_count(&[]), 0);
    }

    #[test]
    fn test_smi_value_line() {
        let mut lines: Vec<String> = (0..12).map(|i| format!("line {i}")).collect();
        lines[8] = ROW.to_string();
        lines[11] = "second gpu".to_string();
        let output = lines.join("\n");

        assert_eq!(smi_value_line(&output, 0).unwrap(), ROW);
        assert_eq!(smi_value_line(&output, 1).unwrap(), "second gpu");
        assert!(smi_value_line(&output, 2).is_err());
    }
}
