//! GPU rendering subsystem.
//!
//! Renderers own their GPU resources (pipelines, buffers, textures) and create them
//! lazily from a [`RenderCtx`], so they can be constructed before a device exists.
//!
//! Convention:
//! - world space is the camera's space; sprites are unit quads placed by a model matrix
//! - textures are sRGB RGBA8, sampled with nearest filtering

mod ctx;
pub mod sprite;
pub mod texture;

pub use ctx::{RenderCtx, RenderTarget};
pub use sprite::{Sprite, SpriteRenderer};
pub use texture::{ImageRgba8, Texture, TextureError, TextureId};
