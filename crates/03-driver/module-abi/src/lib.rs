//! Module contract shared by the bridge core and every host module.
//!
//! This crate defines the boundary between the bridge (layer 05) and module
//! implementations (layer 04). A module declares its callable surface as an
//! explicit [`MethodTable`]; the wire descriptor sent to the worker is derived
//! from that same table, so method positions on both sides agree by
//! construction.

mod args;
mod clock;
mod error;
mod handle;
mod method;
mod module;
mod notification;

pub use args::Args;
pub use bridge_channel::{MethodId, ModuleConfig, ModuleId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ModuleError, ModuleResult};
pub use handle::{BridgeHandle, JsCallback};
pub use method::{Handler, Method, MethodKind, MethodTable};
pub use module::{
    bridge_module_name_for_class, BridgeModule, BridgeSignal, ModuleClass, ModuleInstance,
    NativeModule,
};
pub use notification::{Listener, ListenerId, NotificationCenter, JAVASCRIPT_DID_LOAD};
pub use serde_json::Value;

/// Flat name → value mapping exported by a module at description time.
pub type Constants = serde_json::Map<String, Value>;
