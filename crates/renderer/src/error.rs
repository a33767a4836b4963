use crate::types::ShaderStage;

/// Diagnostics produced while turning a [`ShaderSource`](crate::ShaderSource)
/// into a linked program.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("{stage} stage failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("program failed to link: {log}")]
    Link { log: String },
}

impl BuildError {
    /// Compiler or linker output carried by the error.
    pub fn log(&self) -> &str {
        match self {
            BuildError::Compile { log, .. } | BuildError::Link { log } => log,
        }
    }
}

/// Raised when no graphics context could be acquired from the host surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("no drawing context available (tried: {})", attempted.join(", "))]
    ContextUnavailable { attempted: Vec<String> },
}

/// Failures reported while presenting a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The frame could not be produced this time; the next one may succeed.
    #[error("frame skipped: {0}")]
    Transient(String),
    /// The drawing context is gone and every GPU object with it.
    #[error("graphics context lost: {0}")]
    ContextLost(String),
}

/// Failures of the software canvas used by the animators.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("cannot allocate a {width}x{height} canvas")]
    Allocation { width: u32, height: u32 },
    #[error("failed to encode canvas as PNG: {0}")]
    Encode(String),
}
