//! String-framed message channel between the host bridge and the worker.
//!
//! * [`Envelope`] – the `{topic, payload}` record that is the only thing ever
//!   sent across the channel, serialised to a single JSON string.
//! * [`HostMessage`] / [`WorkerMessage`] – typed views over the envelope for
//!   each direction.
//! * [`schema`] – wire shapes shared by both sides (module descriptors, call
//!   batches, native calls).
//! * [`HostPort`] / [`WorkerPort`] – the two ends of a channel pair. Only
//!   `String` frames cross; neither side can observe the other's objects.

mod envelope;
mod error;
mod port;
pub mod schema;

pub use envelope::{Envelope, HostMessage, LoadBridgeConfig, WorkerMessage};
pub use error::{ChannelError, ChannelResult, ProtocolError};
pub use port::{pair, HostPort, Outbound, WorkerPort};
pub use schema::{CallBatch, ModuleConfig, ModuleId, MethodId, NativeCall};

/// Topic names used on the wire.
pub mod topic {
    /// Host → worker: module descriptors and bundle location.
    pub const LOAD_BRIDGE_CONFIG: &str = "loadBridgeConfig";
    /// Host → worker: invoke a worker-side module method.
    pub const CALL_FUNCTION_RETURN_FLUSHED_QUEUE: &str = "callFunctionReturnFlushedQueue";
    /// Host → worker: resume a worker-side callback.
    pub const INVOKE_CALLBACK_AND_RETURN_FLUSHED_QUEUE: &str =
        "invokeCallbackAndReturnFlushedQueue";
    /// Host → worker: frame tick, asks for buffered calls.
    pub const FLUSH: &str = "flush";
    /// Worker → host: the bundle finished evaluating.
    pub const BUNDLE_FINISHED_LOADING: &str = "bundleFinishedLoading";
    /// Worker → host: a batch of native calls.
    pub const FLUSHED_QUEUE: &str = "flushedQueue";
    /// Worker → host: bundle loading progress.
    pub const UPDATE_PROGRESS: &str = "updateProgress";
}
