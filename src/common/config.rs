use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::provider_factory::ProviderKind;
use crate::device::types::Unit;
use crate::error::{Error, Result};

/// Application configuration constants
pub struct AppConfig;

impl AppConfig {
    // Polling
    pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 2;
    pub const MIN_UPDATE_INTERVAL_SECS: u64 = 1;

    // Persistence
    pub const SETTINGS_DIR_NAME: &'static str = "nvidia-util";
    pub const SETTINGS_FILE_NAME: &'static str = "settings.json";

    pub const NOTIFICATION_DURATION_SECS: u64 = 5;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl From<TemperatureUnit> for Unit {
    fn from(value: TemperatureUnit) -> Self {
        match value {
            TemperatureUnit::Celsius => Unit::Celsius,
            TemperatureUnit::Fahrenheit => Unit::Fahrenheit,
        }
    }
}

/// User choices persisted by the display layer. The core only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: ProviderKind,
    pub refresh_interval_secs: u64,
    pub temperature_unit: TemperatureUnit,
    /// Indexed by property slot; a missing entry means active.
    pub property_flags: Vec<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Auto,
            refresh_interval_secs: AppConfig::DEFAULT_UPDATE_INTERVAL_SECS,
            temperature_unit: TemperatureUnit::Celsius,
            property_flags: Vec::new(),
        }
    }
}

impl Settings {
    /// `<user config dir>/nvidia-util/settings.json`, e.g.
    /// `~/.config/nvidia-util/settings.json` on Linux.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or_else(|| {
            Error::Config("could not determine the user configuration directory".to_string())
        })?;

        Ok(base
            .join(AppConfig::SETTINGS_DIR_NAME)
            .join(AppConfig::SETTINGS_FILE_NAME))
    }

    /// Load settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        let settings: Settings = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs < AppConfig::MIN_UPDATE_INTERVAL_SECS {
            return Err(Error::Config(format!(
                "refresh interval must be at least {}s",
                AppConfig::MIN_UPDATE_INTERVAL_SECS
            )));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(
            self.refresh_interval_secs
                .max(AppConfig::MIN_UPDATE_INTERVAL_SECS),
        )
    }

    pub fn is_active(&self, slot: usize) -> bool {
        self.property_flags.get(slot).copied().unwrap_or(true)
    }

    /// Flip the flag of `slot` and return its new state.
    pub fn toggle(&mut self, slot: usize) -> bool {
        if self.property_flags.len() <= slot {
            self.property_flags.resize(slot + 1, true);
        }
        self.property_flags[slot] = !self.property_flags[slot];
        self.property_flags[slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.refresh_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings {
            provider: ProviderKind::Settings,
            temperature_unit: TemperatureUnit::Fahrenheit,
            ..Settings::default()
        };
        settings.toggle(2);
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        assert!(loaded.is_active(0));
        assert!(!loaded.is_active(2));
        assert!(loaded.is_active(10));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "provider": "smi" }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.provider, ProviderKind::Smi);
        assert_eq!(settings.refresh_interval_secs, 2);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load(&path), Err(Error::Config(_))));

        fs::write(&path, r#"{ "refresh_interval_secs": 0 }"#).unwrap();
        assert!(matches!(Settings::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_default_path_under_config_dir() {
        match (dirs::config_dir(), Settings::default_path()) {
            (Some(base), Ok(path)) => {
                assert!(path.starts_with(&base));
                assert!(path.ends_with("nvidia-util/settings.json"));
            }
            (None, Err(e)) => assert!(matches!(e, Error::Config(_))),
            (base, path) => panic!("config dir {base:?} but default path {path:?}"),
        }
    }

    #[test]
    fn test_toggle_round_trip() {
        let mut settings = Settings::default();
        assert!(!settings.toggle(1));
        assert_eq!(settings.property_flags, vec![true, false]);
        assert!(settings.toggle(1));
    }
}
