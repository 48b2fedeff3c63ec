//! CPU layer compositor.
//!
//! Blends an overlay (`top`) over a background (`bottom`) with a uniform
//! opacity, per pixel, before the result is uploaded. Pure: no GPU calls.

mod blend;

pub use blend::{blend, blend_into, blend_pixel, CompositeError, Opacity};
