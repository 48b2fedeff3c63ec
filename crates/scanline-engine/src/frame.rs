//! Per-frame layer composition.
//!
//! [`FrameComposer`] owns the three logical-resolution layers of a frame:
//! a static background, a CPU-drawn overlay, and the target that receives
//! their blend and is then stretched to the output by a [`ShaderProgram`].

use std::path::Path;

use crate::compositor::{blend_into, CompositeError, Opacity};
use crate::device::Gpu;
use crate::pipeline::{PipelineError, RenderRequest, ShaderProgram};
use crate::pixels::{PixelBuffer, OPAQUE_BLACK};
use crate::render::{RenderCtx, RenderTarget};
use crate::texture::{GpuTexture, TextureError};

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Composite(#[from] CompositeError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("{0} layer is not allocated")]
    Unallocated(&'static str),
}

pub struct FrameComposer {
    width: u32,
    height: u32,
    opacity: Opacity,

    background: GpuTexture,
    overlay: GpuTexture,
    target: GpuTexture,
}

impl FrameComposer {
    /// Allocates `width × height` layers cleared to opaque black.
    pub fn new(gpu: &Gpu, width: u32, height: u32, opacity: Opacity) -> Result<Self, FrameError> {
        let cleared = PixelBuffer::filled(width, height, OPAQUE_BLACK);

        let mut background = GpuTexture::with_label("background");
        let mut overlay = GpuTexture::with_label("overlay");
        let mut target = GpuTexture::with_label("target");
        for layer in [&mut background, &mut overlay, &mut target] {
            layer.load_from_pixels(gpu, cleared.as_slice(), width, height)?;
        }

        log::debug!("frame layers created ({width}x{height}, opacity {}%)", opacity.get());
        Ok(Self {
            width,
            height,
            opacity,
            background,
            overlay,
            target,
        })
    }

    /// Replaces the background with a bitmap of the layer size.
    pub fn load_background_file(&mut self, gpu: &Gpu, path: impl AsRef<Path>) -> Result<(), TextureError> {
        self.background
            .load_from_file(gpu, path, self.width, self.height)
    }

    /// Replaces the background with canonical pixels of the layer size.
    pub fn load_background_pixels(&mut self, gpu: &Gpu, pixels: &[u32]) -> Result<(), TextureError> {
        self.background
            .load_from_pixels(gpu, pixels, self.width, self.height)
    }

    /// Redraws the overlay with `draw_overlay` and blends it over the
    /// background into the target.
    ///
    /// Layers are locked background, overlay, target and unlocked in reverse.
    /// They are unlocked even when drawing or blending fails.
    pub fn compose<F>(&mut self, gpu: &Gpu, draw_overlay: F) -> Result<(), FrameError>
    where
        F: FnOnce(&mut [u32], u32, u32),
    {
        let composed = self
            .lock_layers(gpu)
            .and_then(|()| self.blend_locked(draw_overlay));
        let unlocked = self.unlock_layers(gpu);
        composed.and(unlocked)
    }

    /// Stretches the target over the whole of `target`.
    pub fn render(
        &self,
        program: &mut ShaderProgram,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
    ) -> Result<(), FrameError> {
        let request = RenderRequest::full(self.width, self.height, target.width, target.height);
        program.render(ctx, target, &request, &self.target)?;
        Ok(())
    }

    fn lock_layers(&mut self, gpu: &Gpu) -> Result<(), FrameError> {
        self.background.lock(gpu)?;
        self.overlay.lock(gpu)?;
        self.target.lock(gpu)?;
        Ok(())
    }

    fn unlock_layers(&mut self, gpu: &Gpu) -> Result<(), FrameError> {
        let target = self.target.unlock(gpu);
        let overlay = self.overlay.unlock(gpu);
        let background = self.background.unlock(gpu);
        target?;
        overlay?;
        background?;
        Ok(())
    }

    fn blend_locked<F>(&mut self, draw_overlay: F) -> Result<(), FrameError>
    where
        F: FnOnce(&mut [u32], u32, u32),
    {
        let (width, height) = (self.width, self.height);

        let overlay = self
            .overlay
            .pixels_mut()
            .ok_or(FrameError::Unallocated("overlay"))?;
        draw_overlay(overlay, width, height);

        let bottom = self
            .background
            .pixels()
            .ok_or(FrameError::Unallocated("background"))?;
        let top = self
            .overlay
            .pixels()
            .ok_or(FrameError::Unallocated("overlay"))?;
        let dest = self
            .target
            .pixels_mut()
            .ok_or(FrameError::Unallocated("target"))?;

        blend_into(bottom, top, self.opacity, width, height, dest)?;
        Ok(())
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
    pub fn opacity(&self) -> Opacity {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: Opacity) {
        self.opacity = opacity;
    }

    pub fn background(&self) -> &GpuTexture {
        &self.background
    }

    pub fn overlay(&self) -> &GpuTexture {
        &self.overlay
    }

    /// Blended layer, as drawn by [`FrameComposer::render`].
    pub fn target(&self) -> &GpuTexture {
        &self.target
    }
}
