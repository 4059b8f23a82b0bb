use serde::{Deserialize, Serialize};
use std::fmt;

use crate::device::common::constants::{
    DEGREE_SIGN, MEMORY_SUFFIX_MIB, PERCENTAGE_SUFFIX, POWER_SUFFIX_W, RPM_SUFFIX,
};

/// The metrics a provider can expose, in the order providers build them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Utilization,
    Temperature,
    Memory,
    Fan,
    Power,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Utilization,
        MetricKind::Temperature,
        MetricKind::Memory,
        MetricKind::Fan,
        MetricKind::Power,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Utilization => "Utilization",
            MetricKind::Temperature => "Temperature",
            MetricKind::Memory => "Memory Usage",
            MetricKind::Fan => "Fan Speed",
            MetricKind::Power => "Power Usage",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            MetricKind::Utilization => "nvidia-card-symbolic",
            MetricKind::Temperature => "nvidia-temp-symbolic",
            MetricKind::Memory => "nvidia-ram-symbolic",
            MetricKind::Fan => "nvidia-fan-symbolic",
            MetricKind::Power => "nvidia-power-symbolic",
        }
    }

    pub fn default_unit(&self) -> Unit {
        match self {
            MetricKind::Utilization | MetricKind::Memory | MetricKind::Fan => Unit::Percent,
            MetricKind::Temperature => Unit::Celsius,
            MetricKind::Power => Unit::Watts,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    None,
    Celsius,
    Fahrenheit,
    Percent,
    #[serde(rename = "mib")]
    MiB,
    Watts,
    Rpm,
}

impl Unit {
    /// Text appended to a formatted value.
    pub fn suffix(&self) -> String {
        match self {
            Unit::None => String::new(),
            Unit::Celsius => format!("{DEGREE_SIGN}C"),
            Unit::Fahrenheit => format!("{DEGREE_SIGN}F"),
            Unit::Percent => PERCENTAGE_SUFFIX.to_string(),
            Unit::MiB => MEMORY_SUFFIX_MIB.to_string(),
            Unit::Watts => POWER_SUFFIX_W.to_string(),
            Unit::Rpm => RPM_SUFFIX.to_string(),
        }
    }

    pub fn is_temperature(&self) -> bool {
        matches!(self, Unit::Celsius | Unit::Fahrenheit)
    }
}

/// Which tool a property's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSource {
    /// nvidia-smi
    Smi,
    /// nvidia-settings
    Settings,
}

/// A typed value parsed out of raw tool output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    Percent(u64),
    Celsius(u64),
    /// Used and total memory in MiB
    Memory { used: u64, total: u64 },
    Watts(u64),
}

/// What a listener receives each tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Text(String),
    /// The metric is unavailable for the rest of the session.
    Err,
}

impl PropertyValue {
    pub fn is_err(&self) -> bool {
        matches!(self, PropertyValue::Err)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(text) => f.write_str(text),
            PropertyValue::Err => f.write_str("ERR"),
        }
    }
}
