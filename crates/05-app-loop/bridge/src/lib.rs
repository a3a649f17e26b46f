//! Host side of the worker bridge.
//!
//! The [`Bridge`] owns the host end of the worker channel, the module
//! registry and the pending native-call queue. Its life is:
//!
//! 1. [`BridgeBuilder::build`] instantiates every module class in
//!    registration order, derives descriptors and resolves the well-known
//!    modules. Duplicate names or a missing required module fail here.
//! 2. [`Bridge::load_bridge_config`] sends the descriptors and bundle location.
//! 3. Inbound frames are handled by [`Bridge::pump`]; each rendering tick
//!    calls [`Bridge::frame`] to drain and dispatch queued calls.

mod bridge;
mod config;
mod error;
mod registry;
mod stats;
mod well_known;

pub use bridge::{Bridge, BridgeBuilder, BridgeState, FrameReport};
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult, DispatchError};
pub use registry::ModuleRegistry;
pub use stats::BridgeStats;
pub use well_known::{names, WellKnownModules};
