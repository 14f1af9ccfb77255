//! # Configuration Management
//!
//! This module handles loading and saving the clock-config.toml file. It
//! covers the clock style and timing, the display backend, and the color
//! table. Every section has defaults, so a partial file (or none at all) is
//! fine.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::compose::ColorTable;
use crate::display::DisplayBackend;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "clock-config.toml";

/// Application configuration loaded from clock-config.toml
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Clock style and loop timing
    pub clock: ClockConfig,
    /// Display backend selection
    pub display: DisplayConfig,
    /// Colors for background, field digits and perimeter ring
    pub colors: ColorTable,
}

/// Clock style and run-loop settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Style code 0–3. Unknown codes are reported on every tick rather than
    /// rejected at startup.
    pub style: u8,
    /// Seconds to keep the clock running; 0 runs until stopped
    pub duration: u64,
    /// Seconds between ticks
    pub heartbeat: u64,
    /// Hours subtracted from system time before display
    pub delta_hours: i64,
    /// Minutes subtracted from system time before display
    pub delta_minutes: i64,
}

/// Display selection
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// auto, sensehat or terminal
    pub backend: DisplayBackend,
    /// Dim the Sense HAT for dark rooms
    pub low_light: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            style: 2, // Minute digits with 12-hour arcs
            duration: 0,
            heartbeat: 2,
            delta_hours: 0,
            delta_minutes: 0,
        }
    }
}

impl Config {
    /// Load configuration from clock-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(
                        "Loaded configuration from {} (style {})",
                        path.display(),
                        config.clock.style
                    );
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format in {}: {}", path.display(), e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!(
                    "No config file at {}, using default configuration",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Save current configuration to clock-config.toml
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(DEFAULT_CONFIG_PATH)
    }
}
