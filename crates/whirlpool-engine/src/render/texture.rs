//! Sprite textures: decoding image files and uploading them to the GPU.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while turning an image file into a GPU texture.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to read image {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image {} is {width}x{height}, device limit is {max}", path.display())]
    TooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },
}

impl TextureError {
    /// Path of the asset that failed to load.
    pub fn path(&self) -> &Path {
        match self {
            TextureError::Io { path, .. }
            | TextureError::Decode { path, .. }
            | TextureError::TooLarge { path, .. } => path,
        }
    }
}

/// Opaque handle to a texture owned by a renderer.
///
/// Handles are issued once and stay valid for the renderer's lifetime.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId(u32);

impl TextureId {
    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Builds a handle from a raw id, for driving app logic without a device.
    #[doc(hidden)]
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

/// Decoded straight-alpha RGBA8 pixels, rows top to bottom.
#[derive(Debug, Clone)]
pub struct ImageRgba8 {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageRgba8 {
    /// Reads and decodes an image file, converting any supported layout to RGBA8.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let rgba = image::load_from_memory(&bytes)
            .map_err(|source| TextureError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();

        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// Fails if either side exceeds `max_dimension`.
    pub fn check_fits(&self, path: &Path, max_dimension: u32) -> Result<(), TextureError> {
        if self.width > max_dimension || self.height > max_dimension {
            return Err(TextureError::TooLarge {
                path: path.to_path_buf(),
                width: self.width,
                height: self.height,
                max: max_dimension,
            });
        }
        Ok(())
    }
}

/// A 2D sRGB texture plus the view used for sampling.
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Creates a texture sized to `image` and uploads its pixels.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        image: &ImageRgba8,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width: image.width,
            height: image.height,
        }
    }
}
