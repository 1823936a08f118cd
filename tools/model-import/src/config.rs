//! Loader configuration (model-import.toml)
//!
//! Every key is optional; missing keys fall back to the built-in layout
//! (`Resources/<model>/<model>.gltf`, default texture `white1x1.png`).

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Root directory that holds one subdirectory per model
pub const DEFAULT_ASSET_ROOT: &str = "Resources/";

/// Texture substituted when a material's texture cannot be found
pub const DEFAULT_TEXTURE_FILE_NAME: &str = "white1x1.png";

/// Loader configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Base directory; model `name` lives in `asset_root/name/`
    pub asset_root: PathBuf,
    /// Fallback texture file name, resolved inside the model's directory
    pub default_texture: String,
    /// Model file extensions probed in order (`name.<ext>`)
    pub model_extensions: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
            default_texture: DEFAULT_TEXTURE_FILE_NAME.to_string(),
            model_extensions: vec!["gltf".to_string(), "glb".to_string()],
        }
    }
}

impl LoaderConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_asset_root(mut self, asset_root: impl Into<PathBuf>) -> Self {
        self.asset_root = asset_root.into();
        self
    }

    /// Directory holding the model file and its textures
    pub fn model_dir(&self, model_name: &str) -> PathBuf {
        self.asset_root.join(model_name)
    }
}
