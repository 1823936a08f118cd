//! Graphics device seam
//!
//! The import pipeline only ever asks the device for one thing: turn decoded
//! pixels into a GPU texture. [`HeadlessDevice`] satisfies that without a GPU
//! and is what the CLI and the tests run against.

use anyhow::Result;
use hashbrown::HashMap;
use model_common::{PixelFormat, TextureHandle};

/// Allocates GPU-visible resources for imported models
pub trait GraphicsDevice {
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<TextureHandle>;
}

impl<D: GraphicsDevice + ?Sized> GraphicsDevice for Box<D> {
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<TextureHandle> {
        (**self).create_texture(width, height, format, data)
    }
}

/// Texture allocation recorded by [`HeadlessDevice`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRecord {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub size_bytes: usize,
}

/// Device that validates and records allocations without touching a GPU
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    textures: HashMap<u32, TextureRecord>,
    next_texture_id: u32,
    bytes_allocated: usize,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&TextureRecord> {
        self.textures.get(&handle.0)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<TextureHandle> {
        if width == 0 || height == 0 {
            anyhow::bail!("Texture has zero size: {}x{}", width, height);
        }

        let expected_size = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected_size {
            anyhow::bail!(
                "Pixel data size mismatch: expected {} bytes, got {}",
                expected_size,
                data.len()
            );
        }

        let handle = TextureHandle(self.next_texture_id);
        self.next_texture_id += 1;

        self.textures.insert(
            handle.0,
            TextureRecord {
                width,
                height,
                format,
                size_bytes: expected_size,
            },
        );
        self.bytes_allocated += expected_size;

        tracing::debug!(
            "Created texture {}: {}x{}, {} bytes",
            handle.0,
            width,
            height,
            expected_size
        );

        Ok(handle)
    }
}
