use serde::Serialize;

/// Running counters for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    /// Frames received from the worker.
    pub inbound: u64,
    /// Inbound frames dropped as unknown or malformed.
    pub dropped: u64,
    /// Native calls accepted into the pending queue.
    pub queued: u64,
    /// Native calls that completed.
    pub dispatched: u64,
    /// Native calls that failed and were skipped.
    pub failed: u64,
    /// Calls to `frame()`.
    pub frames: u64,
}
