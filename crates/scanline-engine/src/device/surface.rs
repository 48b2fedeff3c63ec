use anyhow::{Context, Result};
use wgpu::SurfaceError;

use super::{Gpu, GpuFrame, SurfaceInit};

/// What the driver should do after [`WindowSurface::begin_frame`] fails.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The swapchain was rebuilt; try again on the next redraw.
    Reconfigured,
    /// Drop this frame only.
    SkipFrame,
    /// The device ran out of memory; stop drawing.
    Fatal,
}

/// Presentation surface bound to a window.
///
/// Created from the [`Gpu`]'s instance before the adapter is chosen (so the
/// adapter can be surface-compatible), then configured once the device
/// exists. The `'w` lifetime ties the surface to the window handle.
pub struct WindowSurface<'w> {
    surface: wgpu::Surface<'w>,

    /// Active configuration; `None` until [`WindowSurface::configure`].
    config: Option<wgpu::SurfaceConfiguration>,

    /// Current drawable size in physical pixels.
    size: (u32, u32),
}

impl<'w> WindowSurface<'w> {
    /// Creates an unconfigured surface for `target`.
    pub fn new(
        instance: &wgpu::Instance,
        target: impl Into<wgpu::SurfaceTarget<'w>>,
        size: (u32, u32),
    ) -> Result<Self> {
        let surface = instance
            .create_surface(target)
            .context("failed to create wgpu surface")?;

        Ok(Self {
            surface,
            config: None,
            size,
        })
    }

    /// Raw surface, for adapter selection.
    pub fn raw(&self) -> &wgpu::Surface<'w> {
        &self.surface
    }

    /// Chooses format/alpha mode against `gpu` and configures the swapchain.
    pub fn configure(&mut self, gpu: &Gpu, init: &SurfaceInit) -> Result<()> {
        anyhow::ensure!(self.size.0 > 0 && self.size.1 > 0, "window has zero size");

        let caps = self.surface.get_capabilities(gpu.adapter());
        let format = choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = choose_alpha_mode(&caps, init.alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: self.size.0,
            height: self.size.1,
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        self.surface.configure(gpu.device(), &config);
        log::debug!("surface configured: {format:?} {}x{}", self.size.0, self.size.1);

        self.config = Some(config);
        Ok(())
    }

    /// Returns the active surface format, if configured.
    pub fn format(&self) -> Option<wgpu::TextureFormat> {
        self.config.as_ref().map(|c| c.format)
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Reconfigures the surface after a resize.
    ///
    /// wgpu does not support configuring a surface with a 0x0 size; in that case,
    /// only internal state is updated and configuration is deferred.
    pub fn resize(&mut self, gpu: &Gpu, width: u32, height: u32) {
        self.size = (width, height);
        if width == 0 || height == 0 {
            return;
        }

        if let Some(config) = self.config.as_mut() {
            config.width = width;
            config.height = height;
            self.surface.configure(gpu.device(), config);
        }
    }

    /// Acquires the next surface texture and creates an encoder.
    ///
    /// The returned frame owns the surface texture. Releasing it (after submission)
    /// presents the frame.
    pub fn begin_frame(&self, gpu: &Gpu) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let width = surface_texture.texture.width();
        let height = surface_texture.texture.height();

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder: gpu.encoder("scanline frame encoder"),
            width,
            height,
        })
    }

    /// Submits the recorded commands for the given frame and presents it.
    pub fn submit(&self, gpu: &Gpu, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
            ..
        } = frame;

        gpu.submit(encoder);
        drop(view);
        surface_texture.present();
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_error(&mut self, gpu: &Gpu, err: SurfaceError) -> SurfaceErrorAction {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => {
                if let Some(config) = self.config.as_ref() {
                    if self.size.0 > 0 && self.size.1 > 0 {
                        self.surface.configure(gpu.device(), config);
                    }
                }
                SurfaceErrorAction::Reconfigured
            }
            SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
            SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let preferred: &[wgpu::TextureFormat] = if prefer_srgb {
        &[
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ]
    } else {
        &[wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Rgba8Unorm]
    };

    preferred
        .iter()
        .copied()
        .find(|f| caps.formats.contains(f))
        .or_else(|| caps.formats.first().copied())
}

fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}
