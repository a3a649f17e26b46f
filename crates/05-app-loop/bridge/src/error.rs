use bridge_channel::{ChannelError, MethodId, ModuleId};
use module_abi::ModuleError;
use thiserror::Error;

/// Construction and lifecycle failures. All of these are fatal to startup.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("module `{name}` is registered more than once")]
    DuplicateModule { name: String },
    #[error("required module `{name}` is not registered")]
    MissingModule { name: &'static str },
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("bridge configuration was already sent to the worker")]
    ConfigAlreadySent,
}

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Failure of a single native call; isolated from the rest of the frame.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no module with id {module_id}")]
    UnknownModule { module_id: ModuleId },
    #[error("{module}.{method} (#{method_id}) failed: {source}")]
    Call {
        module: String,
        method: String,
        method_id: MethodId,
        #[source]
        source: ModuleError,
    },
    #[error("{module}.{method} (#{method_id}) panicked")]
    Panicked {
        module: String,
        method: String,
        method_id: MethodId,
    },
}
