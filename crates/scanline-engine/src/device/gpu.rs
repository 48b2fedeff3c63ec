use anyhow::{Context, Result};

use super::GpuInit;

/// Owns wgpu core objects.
///
/// This type is the low-level rendering context:
/// - creates and stores Instance/Adapter/Device/Queue
/// - works headless or against a presentation surface
///
/// Every texture and program in the engine is created from, and used with,
/// exactly one `Gpu`. It is meant to live on the rendering thread for the
/// lifetime of the process.
pub struct Gpu {
    /// wgpu instance used to create the adapter and any surface.
    instance: wgpu::Instance,

    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,
}

impl Gpu {
    /// Creates the instance described by `init`.
    ///
    /// Drivers that present to a window create the instance first, make a
    /// surface from it, then call [`Gpu::with_instance`].
    pub fn create_instance(init: &GpuInit) -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        })
    }

    /// Creates a context without any surface (offscreen rendering, tests).
    pub async fn headless(init: GpuInit) -> Result<Self> {
        let instance = Self::create_instance(&init);
        Self::with_instance(instance, None, init).await
    }

    /// Blocking variant of [`Gpu::headless`].
    pub fn headless_blocking(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::headless(init))
    }

    /// Acquires adapter + device from an existing instance.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn with_instance(
        instance: wgpu::Instance,
        compatible_surface: Option<&wgpu::Surface<'_>>,
        init: GpuInit,
    ) -> Result<Self> {
        let GpuInit {
            backends: _,
            power_preference,
            force_fallback_adapter,
            required_features,
            required_limits,
        } = init;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!(
            "using adapter `{}` ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("scanline device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Largest width/height accepted for a 2D texture on this device.
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Creates a command encoder with a label.
    pub fn encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    /// Submits one encoder and returns once the submission is queued.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) -> wgpu::SubmissionIndex {
        self.queue.submit(std::iter::once(encoder.finish()))
    }

    /// Blocks until all submitted work has completed.
    pub fn wait_idle(&self) -> Result<()> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("device poll failed: {e}"))
    }
}
