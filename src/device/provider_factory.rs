use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::device::common::constants::{NVIDIA_SETTINGS, NVIDIA_SMI};
use crate::device::common::CommandRunner;
use crate::device::providers::{
    CombinedProvider, OptimusProvider, Provider, SettingsProvider, SmiProvider,
};
use crate::error::{Error, Result};

/// Persisted provider choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Pick from the tools found on PATH
    #[default]
    Auto,
    Smi,
    Settings,
    Combined,
    Optimus,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Auto => "auto",
            ProviderKind::Smi => "smi",
            ProviderKind::Settings => "settings",
            ProviderKind::Combined => "combined",
            ProviderKind::Optimus => "optimus",
        };
        f.write_str(name)
    }
}

/// Resolve `Auto` against the tools on PATH. Other kinds pass through.
pub fn resolve_kind(kind: ProviderKind, runner: &dyn CommandRunner) -> Result<ProviderKind> {
    if kind != ProviderKind::Auto {
        return Ok(kind);
    }

    let smi = runner.find_program(NVIDIA_SMI);
    let settings = runner.find_program(NVIDIA_SETTINGS);

    match (smi, settings) {
        (true, true) => Ok(ProviderKind::Combined),
        (true, false) => Ok(ProviderKind::Smi),
        (false, true) => Ok(ProviderKind::Settings),
        (false, false) => {
            error!("nvidia-settings or nvidia-smi not present");
            Err(Error::NoToolsFound)
        }
    }
}

pub fn create_provider(
    kind: ProviderKind,
    runner: Arc<dyn CommandRunner>,
) -> Result<Box<dyn Provider>> {
    let resolved = resolve_kind(kind, runner.as_ref())?;
    if kind == ProviderKind::Auto {
        info!("Selected {resolved} provider");
    }

    let provider: Box<dyn Provider> = match resolved {
        ProviderKind::Smi => Box::new(SmiProvider::new(runner)),
        ProviderKind::Settings => Box::new(SettingsProvider::new(runner)),
        ProviderKind::Combined | ProviderKind::Auto => Box::new(CombinedProvider::new(runner)),
        ProviderKind::Optimus => Box::new(OptimusProvider::new(runner)),
    };

    Ok(provider)
}
