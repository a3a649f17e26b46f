use bridge_channel::{ChannelError, ProtocolError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("failed to start worker thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("worker thread panicked")]
    Panicked,
    #[error("no host module named `{0}`")]
    UnknownModule(String),
    #[error("host module `{module}` has no method `{method}`")]
    UnknownMethod { module: String, method: String },
    #[error("`{module}.{method}` is not a promise method")]
    NotPromise { module: String, method: String },
    #[error("no callable module named `{0}`")]
    UnknownCallableModule(String),
    #[error("callable module `{module}` has no method `{method}`")]
    UnknownCallableMethod { module: String, method: String },
    #[error("no application registered as `{0}`")]
    UnknownApplication(String),
    #[error("no pending callback {0}")]
    UnknownCallback(u64),
    #[error("argument {index}: {reason}")]
    InvalidArgument { index: usize, reason: String },
    #[error("bundle failed: {0}")]
    Bundle(String),
}

impl WorkerError {
    pub fn bundle(msg: impl Into<String>) -> Self {
        WorkerError::Bundle(msg.into())
    }
}

pub type WorkerResult<T> = Result<T, WorkerError>;
