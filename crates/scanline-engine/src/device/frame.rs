/// Swapchain image acquired for one redraw, with the encoder that draws it.
///
/// Hand it back through [`super::WindowSurface::submit`] before asking for
/// the next one.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
    /// Physical size of `view`.
    pub width: u32,
    pub height: u32,
}
