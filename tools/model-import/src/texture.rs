//! Texture Resolver
//!
//! Material files reference textures by whatever path the authoring tool
//! stored: absolute paths from another machine, relative paths, or files that
//! were never shipped. Only the bare file name is trusted; it is looked up in
//! the model's own directory, and the configured default texture stands in
//! when it is not there.

use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use model_common::{Model, PixelFormat, Texture, TextureId};

use crate::device::GraphicsDevice;
use crate::error::TextureError;

/// Bare file name of a texture reference
///
/// Splits on both `/` and `\` since references written on one platform are
/// read on another. Returns `None` for an empty reference or one ending in a
/// separator.
pub fn extract_file_name(path: &str) -> Option<&str> {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path).trim();
    if name.is_empty() { None } else { Some(name) }
}

/// Outcome of resolving a texture reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TexturePath {
    /// The referenced file exists in the model directory
    Found(PathBuf),
    /// The reference could not be resolved; use the default texture
    Default(PathBuf),
}

impl TexturePath {
    pub fn path(&self) -> &Path {
        match self {
            Self::Found(path) | Self::Default(path) => path,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default(_))
    }
}

/// Resolves and uploads the textures of one model
///
/// Lives for a single load. Textures are cached by resolved path so materials
/// sharing a file share one GPU texture.
#[derive(Debug)]
pub struct TextureResolver {
    model_dir: PathBuf,
    default_texture: String,
    loaded: HashMap<PathBuf, TextureId>,
}

impl TextureResolver {
    pub fn new(model_dir: impl Into<PathBuf>, default_texture: impl Into<String>) -> Self {
        Self {
            model_dir: model_dir.into(),
            default_texture: default_texture.into(),
            loaded: HashMap::new(),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Path of the default texture for this model
    pub fn default_path(&self) -> PathBuf {
        self.model_dir.join(&self.default_texture)
    }

    /// Map a texture reference to a file in the model directory
    pub fn resolve(&self, full_path: &str) -> Result<TexturePath, TextureError> {
        if let Some(file_name) = extract_file_name(full_path) {
            let candidate = self.model_dir.join(file_name);
            if candidate.is_file() {
                return Ok(TexturePath::Found(candidate));
            }
            tracing::debug!("Texture {:?} not found, trying default", candidate);
        }

        let default_path = self.default_path();
        if default_path.is_file() {
            return Ok(TexturePath::Default(default_path));
        }

        Err(TextureError::Unresolved {
            file_name: extract_file_name(full_path)
                .unwrap_or(&self.default_texture)
                .to_string(),
            dir: self.model_dir.clone(),
        })
    }

    /// Resolve, decode and upload a texture, registering it on the model
    ///
    /// A referenced file that fails to decode is replaced by the default
    /// texture once. Nothing is added to the model on failure.
    pub fn load_texture<D: GraphicsDevice + ?Sized>(
        &mut self,
        model: &mut Model,
        device: &mut D,
        full_path: &str,
    ) -> Result<TextureId, TextureError> {
        let resolved = self.resolve(full_path)?;
        if resolved.is_default() {
            tracing::warn!(
                "Texture '{}' not found in {:?}, using default {}",
                full_path,
                self.model_dir,
                self.default_texture
            );
        }

        match self.upload(model, device, resolved.path()) {
            Err(TextureError::Decode(err)) if !resolved.is_default() => {
                let default_path = self.default_path();
                if !default_path.is_file() {
                    return Err(TextureError::Decode(err));
                }
                tracing::warn!(
                    "Failed to decode {:?} ({}), using default {}",
                    resolved.path(),
                    err,
                    self.default_texture
                );
                self.upload(model, device, &default_path)
            }
            result => result,
        }
    }

    fn upload<D: GraphicsDevice + ?Sized>(
        &mut self,
        model: &mut Model,
        device: &mut D,
        path: &Path,
    ) -> Result<TextureId, TextureError> {
        if let Some(&id) = self.loaded.get(path) {
            return Ok(id);
        }

        let image = image::open(path)?.to_rgba8();
        let (width, height) = image.dimensions();
        let format = PixelFormat::Rgba8UnormSrgb;

        let handle = device
            .create_texture(width, height, format, image.as_raw())
            .map_err(TextureError::Device)?;

        let id = model.add_texture(Texture {
            handle,
            width,
            height,
            format,
            path: path.to_path_buf(),
        });
        self.loaded.insert(path.to_path_buf(), id);

        tracing::debug!("Loaded texture {:?} ({}x{})", path, width, height);
        Ok(id)
    }
}
