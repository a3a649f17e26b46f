use std::sync::Arc;

use bridge_channel::{HostMessage, Outbound};
use log::warn;
use serde_json::Value;

use crate::clock::Clock;
use crate::notification::NotificationCenter;

/// A module's only path to the rest of the system.
///
/// The handle does not own the bridge: it carries the outbound half of the
/// worker channel, the shared notification center and the clock.
#[derive(Clone)]
pub struct BridgeHandle {
    outbound: Outbound,
    notifications: NotificationCenter,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for BridgeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeHandle")
            .field("outbound", &self.outbound)
            .finish_non_exhaustive()
    }
}

impl BridgeHandle {
    pub fn new(
        outbound: Outbound,
        notifications: NotificationCenter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            outbound,
            notifications,
            clock,
        }
    }

    /// Fire-and-forget send; a closed worker channel is logged and ignored.
    pub fn send_message(&self, message: &HostMessage) {
        if let Err(err) = self.outbound.send(message) {
            warn!("dropping {} message: {err}", message.topic());
        }
    }

    /// Invokes `module.method(...args)` on the worker side.
    pub fn enqueue_js_call(&self, module: &str, method: &str, args: Vec<Value>) {
        self.send_message(&HostMessage::CallFunction {
            module: module.to_string(),
            method: method.to_string(),
            args,
        });
    }

    /// Same as [`enqueue_js_call`](Self::enqueue_js_call) for a `"Module.method"` target.
    pub fn enqueue_js_call_with_dot_method(&self, module_dot_method: &str, args: Vec<Value>) {
        match module_dot_method.split_once('.') {
            Some((module, method)) if !module.is_empty() && !method.is_empty() => {
                self.enqueue_js_call(module, method, args)
            }
            _ => warn!("ignoring JS call to malformed target `{module_dot_method}`"),
        }
    }

    pub fn enqueue_js_callback(&self, callback_id: u64, args: Vec<Value>) {
        self.send_message(&HostMessage::InvokeCallback { callback_id, args });
    }

    /// Returns a callable that resumes worker code waiting on `callback_id`.
    pub fn callback_from_id(&self, callback_id: u64) -> JsCallback {
        JsCallback {
            id: callback_id,
            bridge: self.clone(),
        }
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }
}

/// Worker-side callback captured by id.
#[derive(Clone, Debug)]
pub struct JsCallback {
    id: u64,
    bridge: BridgeHandle,
}

impl JsCallback {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn invoke(&self, args: Vec<Value>) {
        self.bridge.enqueue_js_callback(self.id, args);
    }
}
