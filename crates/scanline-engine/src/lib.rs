//! Scanline engine crate.
//!
//! Renders a composited 2D frame (a static background blended with a
//! CPU-drawn overlay) onto a GPU target of any size through a shader
//! program. Window and event-loop handling belong to the driver.

pub mod device;
pub mod logging;
pub mod render;

pub mod math;
pub mod pixels;
pub mod compositor;
pub mod texture;
pub mod pipeline;
pub mod frame;

mod resource;

pub use resource::GpuResource;
