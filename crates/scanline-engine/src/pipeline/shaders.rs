//! Built-in WGSL stage sources.
//!
//! All three follow the naming conventions [`super::ShaderProgram`] binds by:
//! a `@group(0) @binding(0)` uniform block, `source` / `sourceSampler` at
//! bindings 1 and 2, and a `fragColor` output.

/// Passes the quad through `modelViewProjection` and forwards `texCoord`.
pub const DEFAULT_VERTEX: &str = include_str!("shaders/default.vert.wgsl");

/// Samples `source` unchanged.
pub const DEFAULT_FRAGMENT: &str = include_str!("shaders/default.frag.wgsl");

/// Scanline and aperture-grille look sized from `sourceSize[0]` and
/// `targetSize`.
pub const CRT_FRAGMENT: &str = include_str!("shaders/crt.frag.wgsl");
