//! GPU textures with an explicit CPU mirror.
//!
//! A [`GpuTexture`] owns one `Rgba8Unorm` image. `lock` downloads it into a
//! CPU-side [`PixelBuffer`](crate::pixels::PixelBuffer), `unlock` uploads the
//! mirror back and drops it. Pixels are in the canonical packed order of
//! [`crate::pixels`].

mod error;
mod gpu_texture;
mod readback;

pub use error::TextureError;
pub use gpu_texture::{GpuTexture, TextureBinding, TextureState};
pub use readback::read_texture_rgba;

/// Format of every texture the engine creates.
pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
