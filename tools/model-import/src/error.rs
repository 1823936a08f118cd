//! Error types for the import pipeline
//!
//! Only failures that abort a whole load surface as [`LoadError`]. Per-node
//! problems (missing textures, malformed polygons, absent layers) are logged
//! and absorbed by the parsers.

use std::path::PathBuf;

use thiserror::Error;

/// The scene importer could not produce a scene from a file
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported model file extension: {0:?}")]
    Unsupported(String),
}

/// A model load failed; the output model was left untouched
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Model loader used before initialize()")]
    NotInitialized,
    #[error("Model '{name}' not found in {dir:?}")]
    ModelNotFound { name: String, dir: PathBuf },
    #[error("Failed to import {path:?}: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: ImportError,
    },
    #[error("Scene in {path:?} has no root node")]
    MissingRoot { path: PathBuf },
}

/// A texture could not be turned into a GPU resource
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("Texture '{file_name}' not found in {dir:?}")]
    Unresolved { file_name: String, dir: PathBuf },
    #[error("Failed to decode texture: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Graphics device rejected texture: {0}")]
    Device(#[source] anyhow::Error),
}

/// Loader configuration could not be read
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
