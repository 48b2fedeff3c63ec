//! Handles passed to draw calls.
//!
//! Convention:
//! - Target rectangles are physical pixels, top-left origin.
//! - Nothing here owns GPU state; callers keep the device and the frame.

mod ctx;

pub use ctx::{RenderCtx, RenderTarget};
