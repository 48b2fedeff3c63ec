/// Renderer-facing context (device + queue).
///
/// This is intentionally small and stable.
#[derive(Clone, Copy)]
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

impl<'a> From<&'a crate::device::Gpu> for RenderCtx<'a> {
    fn from(gpu: &'a crate::device::Gpu) -> Self {
        Self::new(gpu.device(), gpu.queue())
    }
}

/// Target for drawing (encoder + color view + attachment size in pixels).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(
        encoder: &'a mut wgpu::CommandEncoder,
        color_view: &'a wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            encoder,
            color_view,
            width,
            height,
        }
    }

    /// Draws into an acquired surface frame.
    pub fn from_frame(frame: &'a mut crate::device::GpuFrame) -> Self {
        Self::new(&mut frame.encoder, &frame.view, frame.width, frame.height)
    }
}
