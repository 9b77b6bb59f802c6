use crate::controller::RepeatMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Saved session state plus the user-editable bits (preset list location,
/// music directory). Stored as TOML under the platform config dir.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub repeat: RepeatMode,
    #[serde(default)]
    pub music_directory: Option<String>,
    #[serde(default)]
    pub presets_path: Option<String>,
}

fn default_volume() -> f32 {
    0.8
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            shuffle: false,
            repeat: RepeatMode::default(),
            music_directory: None,
            presets_path: None,
        }
    }
}

impl AppConfig {
    pub fn get_config_dir() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("platter");
        std::fs::create_dir_all(&path).ok();
        path
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join("state.toml")
    }

    pub fn load() -> Self {
        let path = Self::get_config_path();
        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(config) = toml::from_str(&content) {
                    return config;
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) {
        let path = Self::get_config_path();
        if let Ok(content) = toml::to_string_pretty(self) {
            let _ = fs::write(path, content);
        }
    }
}
