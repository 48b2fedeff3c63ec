use std::path::Path;

use crate::device::{capture_validation, Gpu};
use crate::pixels::{self, PixelBuffer};
use crate::resource::GpuResource;

use super::{read_texture_rgba, TextureError, TEXTURE_FORMAT};

/// Lock state of a [`GpuTexture`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureState {
    Unallocated,
    Unlocked,
    Locked,
}

/// What a draw call needs to sample a texture.
#[derive(Clone, Copy)]
pub struct TextureBinding<'a> {
    pub view: &'a wgpu::TextureView,
    pub sampler: &'a wgpu::Sampler,
}

struct TextureResource {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

/// A GPU image with an optional CPU-side mirror.
///
/// Invariant: `mirror.is_some()` implies `resource.is_some()`.
#[derive(Default)]
pub struct GpuTexture {
    label: Option<String>,
    resource: Option<TextureResource>,
    width: u32,
    height: u32,
    mirror: Option<PixelBuffer>,
}

impl GpuTexture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texture with a debug label shown in GPU captures and diagnostics.
    pub fn with_label(label: impl Into<String>) -> Self {
        let mut texture = Self::default();
        texture.label = Some(label.into());
        texture
    }

    /// Replaces the texture with `width × height` canonical pixels.
    ///
    /// Any previous image and mirror are released first. On failure the
    /// texture is left unallocated.
    pub fn load_from_pixels(
        &mut self,
        gpu: &Gpu,
        pixels: &[u32],
        width: u32,
        height: u32,
    ) -> Result<(), TextureError> {
        self.free();

        if let Err(e) = self.allocate(gpu, pixels, width, height) {
            log::error!("error loading texture {} from pixels: {e}", self.name());
            self.free();
            return Err(e);
        }

        log::debug!("texture {} loaded ({width}x{height})", self.name());
        Ok(())
    }

    /// Replaces the texture with the contents of an uncompressed bitmap.
    ///
    /// The file must be exactly `width × height`. Its B, G, R channel order
    /// is converted to the canonical order before upload.
    pub fn load_from_file(
        &mut self,
        gpu: &Gpu,
        path: impl AsRef<Path>,
        width: u32,
        height: u32,
    ) -> Result<(), TextureError> {
        self.free();

        let path = path.as_ref();
        let pixels = match decode_bitmap(path, width, height) {
            Ok(p) => p,
            Err(e) => {
                log::error!("error loading texture {} from bitmap: {e}", self.name());
                return Err(e);
            }
        };

        if let Err(e) = self.allocate(gpu, pixels.as_slice(), width, height) {
            log::error!(
                "error loading texture {} from pixels of bitmap `{}`: {e}",
                self.name(),
                path.display()
            );
            self.free();
            return Err(e);
        }

        log::debug!(
            "texture {} loaded from `{}` ({width}x{height})",
            self.name(),
            path.display()
        );
        Ok(())
    }

    /// Downloads the GPU image into a new CPU mirror.
    ///
    /// Returns `Ok(false)` without side effects if the texture is unallocated
    /// or already locked.
    pub fn lock(&mut self, gpu: &Gpu) -> Result<bool, TextureError> {
        let Some(res) = self.resource.as_ref() else {
            log::debug!("lock ignored: texture {} is not allocated", self.name());
            return Ok(false);
        };
        if self.mirror.is_some() {
            log::debug!("lock ignored: texture {} is already locked", self.name());
            return Ok(false);
        }

        let bytes = read_texture_rgba(gpu, &res.texture, self.width, self.height)?;
        let mirror = PixelBuffer::from_vec(self.width, self.height, pixels::from_rgba_bytes(&bytes))
            .map_err(|e| TextureError::Readback(e.to_string()))?;

        self.mirror = Some(mirror);
        Ok(true)
    }

    /// Uploads the CPU mirror over the whole image and drops it.
    ///
    /// Returns `Ok(false)` without side effects if the texture is not locked.
    /// The mirror is dropped even when the device rejects the upload.
    pub fn unlock(&mut self, gpu: &Gpu) -> Result<bool, TextureError> {
        let (Some(res), Some(mirror)) = (self.resource.as_ref(), self.mirror.take()) else {
            log::debug!("unlock ignored: texture {} is not locked", self.name());
            return Ok(false);
        };

        let (width, height) = (self.width, self.height);
        if let Err(e) = capture_validation(gpu.device(), || {
            write_pixels(gpu, &res.texture, mirror.as_slice(), width, height)
        }) {
            log::error!("error updating texture {}: {e}", self.name());
            return Err(TextureError::Upload(e.to_string()));
        }
        Ok(true)
    }

    /// Mirror pixel at `(x, y)`. `None` when unlocked or out of range.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.mirror.as_ref().and_then(|m| m.get(x, y))
    }

    /// Writes a mirror pixel. Returns `false` when unlocked or out of range.
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: u32) -> bool {
        self.mirror.as_mut().is_some_and(|m| m.set(x, y, pixel))
    }

    /// Mirror contents while locked.
    pub fn pixels(&self) -> Option<&[u32]> {
        self.mirror.as_ref().map(PixelBuffer::as_slice)
    }

    /// Mutable mirror contents while locked.
    pub fn pixels_mut(&mut self) -> Option<&mut [u32]> {
        self.mirror.as_mut().map(PixelBuffer::as_mut_slice)
    }

    /// GPU image handle, if allocated.
    pub fn texture(&self) -> Option<&wgpu::Texture> {
        self.resource.as_ref().map(|r| &r.texture)
    }

    /// View + bilinear sampler for drawing, if allocated.
    pub fn binding(&self) -> Option<TextureBinding<'_>> {
        self.resource.as_ref().map(|r| TextureBinding {
            view: &r.view,
            sampler: &r.sampler,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.resource.is_some()
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.mirror.is_some()
    }

    pub fn state(&self) -> TextureState {
        match (&self.resource, &self.mirror) {
            (None, _) => TextureState::Unallocated,
            (Some(_), None) => TextureState::Unlocked,
            (Some(_), Some(_)) => TextureState::Locked,
        }
    }

    /// Releases the GPU image and mirror. Safe to call repeatedly.
    pub fn free(&mut self) {
        self.mirror = None;
        if let Some(res) = self.resource.take() {
            res.texture.destroy();
            log::trace!("texture {} freed", self.name());
        }
        self.width = 0;
        self.height = 0;
    }

    fn allocate(
        &mut self,
        gpu: &Gpu,
        pixels: &[u32],
        width: u32,
        height: u32,
    ) -> Result<(), TextureError> {
        let max = gpu.max_texture_dimension();
        if width == 0 || height == 0 || width > max || height > max {
            return Err(TextureError::Upload(format!(
                "{width}x{height} is outside the supported range 1..={max}"
            )));
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(TextureError::Upload(format!(
                "got {} pixels for {width}x{height} (expected {expected})",
                pixels.len()
            )));
        }

        let device = gpu.device();
        let label = self.label.as_deref();
        let texture = capture_validation(device, || {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label,
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXTURE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST
                    | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            });
            write_pixels(gpu, &texture, pixels, width, height);
            texture
        })
        .map_err(|e| TextureError::Upload(e.to_string()))?;

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Bilinear min/mag filtering.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: self.label.as_deref(),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        self.resource = Some(TextureResource {
            texture,
            view,
            sampler,
        });
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn name(&self) -> &str {
        self.label.as_deref().unwrap_or("<unnamed>")
    }
}

impl GpuResource for GpuTexture {
    fn free(&mut self) {
        GpuTexture::free(self);
    }

    fn is_valid(&self) -> bool {
        self.is_allocated()
    }
}

impl Drop for GpuTexture {
    fn drop(&mut self) {
        self.free();
    }
}

fn write_pixels(gpu: &Gpu, texture: &wgpu::Texture, pixels: &[u32], width: u32, height: u32) {
    gpu.queue().write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &pixels::to_rgba_bytes(pixels),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

fn decode_bitmap(path: &Path, width: u32, height: u32) -> Result<PixelBuffer, TextureError> {
    let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let image = image::load_from_memory_with_format(&bytes, image::ImageFormat::Bmp)
        .map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    if image.width() != width || image.height() != height {
        return Err(TextureError::SizeMismatch {
            path: path.to_path_buf(),
            width,
            height,
            actual_width: image.width(),
            actual_height: image.height(),
        });
    }

    // The decoder resolves the file's B, G, R byte order (and bottom-up row
    // order); from here on pixels are canonical RGBA.
    let rgba = image.to_rgba8();
    PixelBuffer::from_rgba8(width, height, rgba.as_raw())
        .map_err(|e| TextureError::Upload(e.to_string()))
}
