use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// The image could not be created or its pixels could not be written.
    #[error("texture upload failed: {0}")]
    Upload(String),

    /// GPU → CPU copy failed while locking.
    #[error("texture readback failed: {0}")]
    Readback(String),

    #[error("failed to read bitmap `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode bitmap `{path}`")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("bitmap `{path}` is {actual_width}x{actual_height}, expected {width}x{height}")]
    SizeMismatch {
        path: PathBuf,
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}
