use std::fmt;
use std::path::PathBuf;

/// Programmable stage of a [`super::ShaderProgram`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }

    pub(crate) fn visibility(self) -> wgpu::ShaderStages {
        match self {
            ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
            ShaderStage::Fragment => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex shader",
            ShaderStage::Fragment => "fragment shader",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("unable to compile {stage}:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("error linking program {program}:\n{log}")]
    Link { program: String, log: String },

    #[error("error binding shader: {reason}")]
    Bind { reason: String, link_log: String },

    #[error("unable to open shader file `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `render` before `init`.
    #[error("vertex specification not initialized")]
    NotInitialized,

    /// `render` without a bound program.
    #[error("no program bound")]
    NotBound,

    /// `render` with a texture that holds no GPU image.
    #[error("source texture is not allocated")]
    MissingTexture,
}
