//! wgpu device and window surface.
//!
//! [`Gpu`] holds the instance, adapter, device and queue; textures and shader
//! programs only ever need it (or a [`crate::render::RenderCtx`] made from it).
//! [`WindowSurface`] and [`GpuFrame`] are for drivers that present to a window.

mod frame;
mod gpu;
mod init;
mod scope;
mod surface;

#[cfg(test)]
pub(crate) mod test_support;

pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::{GpuInit, SurfaceInit};
pub(crate) use scope::capture_validation;
pub use surface::{SurfaceErrorAction, WindowSurface};
