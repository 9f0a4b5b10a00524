#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    #[error("engine rejected soundfont: {0}")]
    EngineRejected(String),
    #[error("sink failure: {0}")]
    SinkFailure(String),
    #[error("not implemented: {0}")]
    NotImplemented(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Stable code reported to the host.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidArgument(_) => "INVALID_ARGUMENT",
            EngineError::ResourceNotFound(_) => "RESOURCE_NOT_FOUND",
            EngineError::EngineRejected(_) => "ENGINE_REJECTED",
            EngineError::SinkFailure(_) => "SINK_FAILURE",
            EngineError::NotImplemented(_) => "NOT_IMPLEMENTED",
            EngineError::Internal(_) => "ERROR",
        }
    }
}

