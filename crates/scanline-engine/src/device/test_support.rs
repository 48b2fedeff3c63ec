use super::{Gpu, GpuInit};

/// Headless device for GPU-backed tests.
///
/// Returns `None` when the machine has no usable adapter, so those tests
/// pass vacuously on GPU-less CI.
pub(crate) fn headless_gpu() -> Option<Gpu> {
    let init = GpuInit {
        power_preference: wgpu::PowerPreference::LowPower,
        ..GpuInit::default()
    };

    match Gpu::headless_blocking(init) {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("skipping GPU test: {e:#}");
            None
        }
    }
}

/// Color attachment that can be read back with
/// [`crate::texture::read_texture_rgba`].
pub(crate) fn offscreen_target(gpu: &Gpu, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("scanline test target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OFFSCREEN_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

pub(crate) const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Channel-wise comparison with a tolerance for filtering/rounding.
pub(crate) fn assert_rgba_near(actual: [u8; 4], expected: [u8; 4], tolerance: u8) {
    let close = actual
        .iter()
        .zip(expected)
        .all(|(a, e)| a.abs_diff(e) <= tolerance);
    assert!(close, "{actual:?} != {expected:?} (±{tolerance})");
}
