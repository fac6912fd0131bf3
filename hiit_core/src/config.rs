//! Configuration file support for HIIT.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/hiit/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub exercise: ExerciseDefaults,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub cues: CueConfig,
}

/// Values used to pre-fill newly created exercises
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseDefaults {
    #[serde(default = "default_prepare_time")]
    pub prepare_time: u32,

    #[serde(default = "default_work_time")]
    pub work_time: u32,

    #[serde(default = "default_rest_time")]
    pub rest_time: u32,

    #[serde(default = "default_rounds")]
    pub rounds: u32,

    #[serde(default = "default_cycles")]
    pub cycles: u32,

    #[serde(default = "default_rest_between_cycles")]
    pub rest_between_cycles: u32,

    #[serde(default = "default_repetitions")]
    pub repetitions: u32,

    #[serde(default = "default_load")]
    pub load: f64,
}

impl Default for ExerciseDefaults {
    fn default() -> Self {
        Self {
            prepare_time: default_prepare_time(),
            work_time: default_work_time(),
            rest_time: default_rest_time(),
            rounds: default_rounds(),
            cycles: default_cycles(),
            rest_between_cycles: default_rest_between_cycles(),
            repetitions: default_repetitions(),
            load: default_load(),
        }
    }
}

/// Playback driver configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Milliseconds between ticks; one tick is one second of workout time
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,

    /// Complete manual sets automatically instead of waiting for input
    #[serde(default)]
    pub auto_advance_manual: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
            auto_advance_manual: false,
        }
    }
}

/// Audio cue configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CueConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Ring the terminal bell for phase changes
    #[serde(default = "default_true")]
    pub terminal_bell: bool,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            terminal_bell: true,
        }
    }
}

// Default value functions
fn default_prepare_time() -> u32 {
    5
}

fn default_work_time() -> u32 {
    45
}

fn default_rest_time() -> u32 {
    15
}

fn default_rounds() -> u32 {
    3
}

fn default_cycles() -> u32 {
    4
}

fn default_rest_between_cycles() -> u32 {
    60
}

fn default_repetitions() -> u32 {
    12
}

fn default_load() -> f64 {
    30.0
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from(".config"))
        });
        base.join("hiit").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = self.to_toml()?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Render the configuration as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Settings(format!("Failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.exercise.prepare_time, 5);
        assert_eq!(config.exercise.work_time, 45);
        assert_eq!(config.exercise.cycles, 4);
        assert_eq!(config.playback.tick_millis, 1000);
        assert!(config.cues.enabled);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.exercise.rest_time, parsed.exercise.rest_time);
        assert_eq!(config.playback.tick_millis, parsed.playback.tick_millis);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[playback]
tick_millis = 250
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.playback.tick_millis, 250);
        assert!(!config.playback.auto_advance_manual); // default
        assert_eq!(config.exercise.rounds, 3); // default
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.cues.terminal_bell = false;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(!loaded.cues.terminal_bell);
    }
}
