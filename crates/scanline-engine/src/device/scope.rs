/// Runs `f` inside a validation error scope on `device`.
///
/// Validation errors raised by anything `f` records on `device` or its queue
/// are returned as `Err` instead of reaching the uncaptured-error handler,
/// which panics by default. Blocks until the scope resolves.
pub(crate) fn capture_validation<T>(
    device: &wgpu::Device,
    f: impl FnOnce() -> T,
) -> Result<T, wgpu::Error> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    match pollster::block_on(scope.pop()) {
        None => Ok(value),
        Some(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::test_support::headless_gpu;

    #[test]
    fn clean_work_passes_through() {
        let Some(gpu) = headless_gpu() else { return };
        let size = capture_validation(gpu.device(), || {
            gpu.device()
                .create_buffer(&wgpu::BufferDescriptor {
                    label: Some("scope ok"),
                    size: 16,
                    usage: wgpu::BufferUsages::UNIFORM,
                    mapped_at_creation: false,
                })
                .size()
        });
        assert_eq!(size.unwrap(), 16);
    }

    #[test]
    fn validation_error_is_returned() {
        let Some(gpu) = headless_gpu() else { return };
        // MAP_READ and MAP_WRITE may not be combined.
        let result = capture_validation(gpu.device(), || {
            gpu.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some("scope bad"),
                size: 16,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::MAP_WRITE,
                mapped_at_creation: false,
            })
        });
        assert!(result.is_err());
    }

    #[test]
    fn scopes_do_not_leak_between_calls() {
        let Some(gpu) = headless_gpu() else { return };
        let bad = capture_validation(gpu.device(), || {
            gpu.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some("scope bad"),
                size: 16,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::MAP_WRITE,
                mapped_at_creation: false,
            })
        });
        assert!(bad.is_err());
        assert!(capture_validation(gpu.device(), || ()).is_ok());
    }
}
