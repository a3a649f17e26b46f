use thiserror::Error;

pub type ModuleResult<T> = Result<T, ModuleError>;

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("missing argument {index}")]
    MissingArgument { index: usize },

    #[error("argument {index} has the wrong shape: {reason}")]
    InvalidArgument { index: usize, reason: String },

    #[error("module {module} has no method {method_id}")]
    UnknownMethod { module: String, method_id: usize },

    #[error("invalid method table for {module}: {reason}")]
    InvalidMethodTable { module: String, reason: String },

    #[error("{0}")]
    Failed(String),
}

impl ModuleError {
    pub fn failed(msg: impl Into<String>) -> Self {
        ModuleError::Failed(msg.into())
    }
}
