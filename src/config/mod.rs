// src/config/mod.rs
pub mod preferences;

pub use preferences::{keys, ConfigStore, PreferenceStore, PreferenceValue};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub processor: ProcessorConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub preferences: PreferenceStore,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProcessorConfig {
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub enable_debug_logging: bool,
    #[serde(default = "default_trace_file")]
    pub trace_file: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            enable_debug_logging: false,
            trace_file: default_trace_file(),
        }
    }
}

fn default_trace_file() -> String {
    "sensor_trace.csv".to_string()
}

/// Physical display size in pixels, as reported by the device.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 2400,
            height: 1080,
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, String> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file: {}", e))?;

    serde_yaml::from_str(&config_str)
        .map_err(|e| format!("Failed to parse config file: {}", e))
}

pub fn save_config<P: AsRef<Path>>(config: &Config, path: P) -> Result<(), String> {
    let yaml = serde_yaml::to_string(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    fs::write(path, yaml)
        .map_err(|e| format!("Failed to write config file: {}", e))
}
