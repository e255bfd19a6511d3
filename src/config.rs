//! Viewer configuration
//!
//! Every field has a default, so a missing or partial `viewer.json` is fine.

use crate::constants;
use crate::error::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// OBJ file to display
    pub asset_path: PathBuf,
    /// Initial window size in logical pixels
    pub window_size: [f32; 2],
    /// Add light and shadow-camera helpers to the scene
    pub debug_helpers: bool,
    /// Translation added to the object after it has been fitted and centered
    pub fit_offset: [f32; 3],
    /// Radians added to the object's Z rotation per frame
    pub spin_per_frame: f32,
    /// Radians of Z rotation per pixel of horizontal drag
    pub drag_sensitivity: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_path: PathBuf::from(constants::DEFAULT_ASSET_PATH),
            window_size: constants::window::DEFAULT_SIZE,
            debug_helpers: false,
            fit_offset: [0.0, 0.0, 0.0],
            spin_per_frame: constants::motion::SPIN_PER_FRAME,
            drag_sensitivity: constants::motion::DRAG_RADIANS_PER_PIXEL,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read the config at `path`, falling back to defaults when the file is absent
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                info!("Loaded viewer config from {}", path.display());
                Self::from_json_str(&contents)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => {
                warn!("Could not read {} ({}), using defaults", path.display(), e);
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ViewerConfig::from_json_str(r#"{ "debug_helpers": true }"#).unwrap();
        assert!(config.debug_helpers);
        assert_eq!(config.asset_path, PathBuf::from(constants::DEFAULT_ASSET_PATH));
        assert_eq!(config.fit_offset, [0.0, 0.0, 0.0]);
        assert_eq!(config.spin_per_frame, constants::motion::SPIN_PER_FRAME);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = ViewerConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, crate::error::ViewerError::Config(_)));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ViewerConfig::load_or_default("definitely/not/here/viewer.json").unwrap();
        assert_eq!(config, ViewerConfig::default());
    }
}
