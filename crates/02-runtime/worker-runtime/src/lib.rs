//! The worker side of the bridge.
//!
//! A worker runs on its own thread and owns everything the application bundle
//! can see: host module descriptors, its own callable modules, pending
//! callbacks and timers. It talks to the host only through a [`WorkerPort`],
//! so nothing it holds is ever shared with host code.
//!
//! Bundles are Rust closures (or [`Bundle`] impls) registered by location in
//! a [`BundleRegistry`]; `loadBridgeConfig` names the one to evaluate.

mod builtins;
mod bundle;
mod context;
mod error;
mod runtime;

use std::thread;

use bridge_channel::WorkerPort;

pub use builtins::{APP_REGISTRY, DEVICE_EVENT_EMITTER, JS_TIMERS};
pub use bundle::{Bundle, BundleRegistry};
pub use context::{AppRunner, Callback, EventHandler, JsContext, JsModule};
pub use error::{WorkerError, WorkerResult};
pub use runtime::WorkerRuntime;

/// Runs a [`WorkerRuntime`] on a dedicated thread until the host hangs up.
pub fn spawn(port: WorkerPort, bundles: BundleRegistry) -> WorkerResult<WorkerThread> {
    let handle = thread::Builder::new()
        .name("bridge-worker".into())
        .spawn(move || WorkerRuntime::new(port, bundles).run())?;
    Ok(WorkerThread { handle })
}

pub struct WorkerThread {
    handle: thread::JoinHandle<WorkerResult<()>>,
}

impl WorkerThread {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker loop to exit.
    pub fn join(self) -> WorkerResult<()> {
        self.handle.join().map_err(|_| WorkerError::Panicked)?
    }
}
