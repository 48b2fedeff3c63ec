//! Minimal linear algebra for the quad pipeline.
//!
//! Storage is row-major `f32`. Vectors are rows: a point is transformed as
//! `p' = p × M`, which is why translation lives in the last matrix row.

mod matrix;

pub use matrix::{multiply, ortho_projection, transform_row, Mat4, Vec4, IDENTITY4};
