// Configuration module
// Static overlay and animation parameters, loaded once at startup

use crate::error::{EngineError, EngineResult};
use crate::frame_store::FrameKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "bongocat.json";

/// Screen edge the overlay is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Top,
    Bottom,
}

/// Layer-shell layer the overlay lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Top,
    #[default]
    Overlay,
}

/// Horizontal placement of the cat inside the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    // Display
    pub monitor_name: Option<String>,
    pub overlay_height: u32,
    pub overlay_position: Position,
    pub overlay_opacity: u32,
    pub layer: LayerType,

    // Cat appearance
    pub cat_height: u32,
    pub cat_x_offset: i32,
    pub cat_y_offset: i32,
    pub cat_align: Alignment,
    pub mirror_horizontal: bool,
    pub mirror_vertical: bool,

    // Animation
    pub idle_frame: u8,
    pub keypress_duration_ms: u32,
    pub fps: u32,
    pub enable_antialiasing: bool,

    // Input
    pub keyboard_devices: Vec<String>,

    pub debug: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            monitor_name: None,
            overlay_height: 100,
            overlay_position: Position::Top,
            overlay_opacity: 255,
            layer: LayerType::Overlay,
            cat_height: 80,
            cat_x_offset: 0,
            cat_y_offset: 0,
            cat_align: Alignment::Center,
            mirror_horizontal: false,
            mirror_vertical: false,
            idle_frame: 0,
            keypress_duration_ms: 100,
            fps: 60,
            enable_antialiasing: true,
            keyboard_devices: Vec::new(),
            debug: false,
        }
    }
}

impl Configuration {
    /// Check every value against its documented range
    pub fn validate(&self) -> EngineResult<()> {
        if !(10..=1000).contains(&self.overlay_height) {
            return Err(EngineError::invalid_config(format!(
                "overlay_height must be between 10 and 1000, got: {}",
                self.overlay_height
            )));
        }
        if self.cat_height < 10 || self.cat_height > self.overlay_height {
            return Err(EngineError::invalid_config(format!(
                "cat_height must be between 10 and overlay_height ({}), got: {}",
                self.overlay_height, self.cat_height
            )));
        }
        if self.overlay_opacity > 255 {
            return Err(EngineError::invalid_config(format!(
                "overlay_opacity must be between 0 and 255, got: {}",
                self.overlay_opacity
            )));
        }
        if !(1..=144).contains(&self.fps) {
            return Err(EngineError::invalid_config(format!(
                "fps must be between 1 and 144, got: {}",
                self.fps
            )));
        }
        if FrameKind::from_index(self.idle_frame as usize).is_none() {
            return Err(EngineError::invalid_config(format!(
                "idle_frame must be between 0 and 3, got: {}",
                self.idle_frame
            )));
        }
        if !(10..=5000).contains(&self.keypress_duration_ms) {
            return Err(EngineError::invalid_config(format!(
                "keypress_duration_ms must be between 10 and 5000, got: {}",
                self.keypress_duration_ms
            )));
        }
        Ok(())
    }

    /// The frame shown while no hand is active
    pub fn idle_frame_kind(&self) -> FrameKind {
        FrameKind::from_index(self.idle_frame as usize).unwrap_or(FrameKind::Idle)
    }

    /// Interval between render ticks in milliseconds
    pub fn frame_interval_ms(&self) -> u64 {
        (1000 / self.fps.max(1)) as u64
    }

    /// Parse and validate a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Configuration =
            serde_json::from_str(text).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a specific file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }
}

/// First existing configuration file in the search path
pub fn find_config_file() -> Option<PathBuf> {
    default_search_paths().into_iter().find(|path| path.is_file())
}

/// Candidate configuration files, in lookup order
fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(
            PathBuf::from(home)
                .join(".config")
                .join("bongocat")
                .join(CONFIG_FILE_NAME),
        );
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Configuration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.idle_frame_kind(), FrameKind::Idle);
        assert_eq!(config.frame_interval_ms(), 16);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config = Configuration::from_json(
            r#"{ "cat_height": 60, "cat_align": "right", "overlay_position": "bottom" }"#,
        )
        .unwrap();
        assert_eq!(config.cat_height, 60);
        assert_eq!(config.cat_align, Alignment::Right);
        assert_eq!(config.overlay_position, Position::Bottom);
        assert_eq!(config.overlay_height, 100);
        assert!(config.enable_antialiasing);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config =
            Configuration::from_json(r#"{ "sleep_begin": "00:00", "fps": 30 }"#).unwrap();
        assert_eq!(config.fps, 30);
    }

    #[test]
    fn cat_taller_than_overlay_is_rejected() {
        let config = Configuration {
            overlay_height: 50,
            cat_height: 80,
            ..Configuration::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn idle_frame_out_of_range_is_rejected() {
        let err = Configuration::from_json(r#"{ "idle_frame": 4 }"#).unwrap_err();
        let engine_err = err.downcast_ref::<EngineError>().unwrap();
        assert!(engine_err.to_string().contains("idle_frame"));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for json in [
            r#"{ "fps": 0 }"#,
            r#"{ "fps": 200 }"#,
            r#"{ "overlay_height": 5 }"#,
            r#"{ "overlay_opacity": 300 }"#,
            r#"{ "keypress_duration_ms": 1 }"#,
        ] {
            assert!(Configuration::from_json(json).is_err(), "{json}");
        }
    }

    #[test]
    fn load_from_path_reads_file() {
        let path = std::env::temp_dir().join(format!(
            "bongocat_config_{}.json",
            std::process::id()
        ));
        fs::write(&path, r#"{ "keypress_duration_ms": 250, "layer": "top" }"#).unwrap();
        let config = Configuration::load_from_path(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(config.keypress_duration_ms, 250);
        assert_eq!(config.layer, LayerType::Top);
    }

    #[test]
    fn search_path_starts_in_working_directory() {
        let paths = default_search_paths();
        assert_eq!(paths[0], PathBuf::from("bongocat.json"));
        if std::env::var_os("HOME").is_some() {
            assert!(paths[1].ends_with(".config/bongocat/bongocat.json"));
        }
    }
}
