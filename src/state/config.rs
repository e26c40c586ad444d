/// Slicer settings
///
/// Defaults for the grid size and naming. Stored as JSON in the user's
/// config directory:
/// - Linux: ~/.config/grid-slicer/config.json
/// - macOS: ~/Library/Application Support/grid-slicer/config.json
/// - Windows: %APPDATA%\grid-slicer\config.json

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Result, SlicerError};

/// All user-tunable settings
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SliceConfig {
    /// Row count used for new images and for unparsable input (default 4)
    pub default_rows: u32,

    /// Column count used for new images and for unparsable input (default 4)
    pub default_cols: u32,

    /// Base name used when the upload's name is empty once its extension is stripped
    pub fallback_base_name: String,

    /// Distance in logical pixels from a line that still grabs it
    pub hit_tolerance: f32,

    /// Directory the save dialog opens in
    pub export_dir: Option<PathBuf>,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            default_rows: 4,
            default_cols: 4,
            fallback_base_name: "stickers".to_string(),
            hit_tolerance: 6.0,
            export_dir: None,
        }
    }
}

impl SliceConfig {
    /// Convert to a JSON string
    #[cfg(test)]
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load from the user's config directory, falling back to defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path).unwrap_or_else(|e| {
                warn!("⚠️  Ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Load from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json).map_err(|e| SlicerError::Config(e.to_string()))?;
        info!("📁 Loaded settings from {}", path.display());
        Ok(config)
    }

    /// Where the settings file lives
    fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("grid-slicer");
        path.push("config.json");
        Some(path)
    }

    /// Interpret a row/column text field
    ///
    /// Anything that is not a positive integer falls back to `default`.
    pub fn parse_count(input: &str, default: u32) -> u32 {
        match input.trim().parse::<u32>() {
            Ok(count) if count > 0 => count,
            _ => default,
        }
    }
}
