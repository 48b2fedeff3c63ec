use crate::device::Gpu;

use super::TextureError;

/// Copies mip 0 of a 4-byte-per-texel texture back to the CPU.
///
/// Returns tightly packed rows (`width * 4` bytes each). The texture must
/// have been created with `COPY_SRC`. Blocks until the copy completes.
pub fn read_texture_rgba(
    gpu: &Gpu,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, TextureError> {
    let unpadded = width * 4;
    let padded = padded_bytes_per_row(width);

    let staging = gpu.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("scanline readback buffer"),
        size: u64::from(padded) * u64::from(height),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = gpu.encoder("scanline readback encoder");
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    gpu.submit(encoder);

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    gpu.wait_idle()
        .map_err(|e| TextureError::Readback(format!("{e:#}")))?;

    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(TextureError::Readback(e.to_string())),
        Err(_) => return Err(TextureError::Readback("map callback dropped".to_string())),
    }

    let mut out = Vec::with_capacity(unpadded as usize * height as usize);
    {
        let mapped = slice.get_mapped_range();
        for row in mapped.chunks_exact(padded as usize) {
            out.extend_from_slice(&row[..unpadded as usize]);
        }
    }
    staging.unmap();

    Ok(out)
}

/// Row pitch satisfying `COPY_BYTES_PER_ROW_ALIGNMENT`.
fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}
