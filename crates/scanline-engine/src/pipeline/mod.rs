//! Shader programs that stretch a texture over a viewport.
//!
//! A [`ShaderProgram`] owns a compiled+linked pair of WGSL stages and the
//! vertex buffers of one quad. Every frame, [`ShaderProgram::render`] fills
//! the uniforms and attributes the program declares (matched by name, see
//! [`shaders`] for the conventions) and draws four vertices as a triangle
//! strip.
//!
//! Stages are compiled with naga before any GPU object is created, so
//! compile and link problems surface as [`PipelineError`] values carrying a
//! readable log instead of device validation errors.

mod error;
mod link;
mod program;
mod quad;
mod reflect;
pub mod shaders;
mod stage;
mod vertex_spec;

pub use error::{PipelineError, ShaderStage};
pub use program::{RenderRequest, ShaderProgram};
pub use quad::QuadGeometry;
pub use vertex_spec::Attribute;
