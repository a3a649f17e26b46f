#![deny(missing_docs)]
//! Shared helpers for modules that emit events to the worker.
//!
//! Emitter modules embed an [`EventEmitter`] and implement
//! [`EventEmitterModule`]; [`emitter_methods`] supplies the `addListener` /
//! `removeListeners` pair the worker calls when it subscribes. Emission is
//! gated on the listener count: with nobody listening, events are dropped
//! with a warning rather than buffered.

use log::warn;
use module_abi::{
    Args, BridgeHandle, BridgeModule, Listener, ListenerId, MethodTable, ModuleResult, Value,
};

/// Worker-side module that receives emitted events.
pub const DEVICE_EVENT_EMITTER: &str = "RCTDeviceEventEmitter";

/// Listener-count change that crossed the observing threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Count went from zero to one.
    StartObserving,
    /// Count dropped to zero.
    StopObserving,
    /// No threshold crossed.
    Unchanged,
}

/// Result of [`EventEmitter::send_event_with_name`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emission {
    /// One outbound call was enqueued; `local` host listeners were notified.
    Sent {
        /// Number of host-side listeners that ran.
        local: usize,
    },
    /// Nobody is listening; nothing was sent.
    Dropped,
}

/// Listener bookkeeping and emission for one module instance.
#[derive(Debug)]
pub struct EventEmitter {
    bridge: BridgeHandle,
    listener_count: usize,
}

impl EventEmitter {
    /// Creates an emitter with no listeners.
    pub fn new(bridge: BridgeHandle) -> Self {
        Self {
            bridge,
            listener_count: 0,
        }
    }

    /// Current listener count.
    pub fn listener_count(&self) -> usize {
        self.listener_count
    }

    /// Overrides the listener count, e.g. for modules that always have an
    /// implicit subscriber.
    pub fn set_listener_count(&mut self, count: usize) {
        self.listener_count = count;
    }

    /// Bridge handle the emitter sends through.
    pub fn bridge(&self) -> &BridgeHandle {
        &self.bridge
    }

    /// Registers one listener, optionally attaching a host-side callback.
    pub fn add_listener(&mut self, event: &str, callback: Option<Listener>) -> Transition {
        if let Some(callback) = callback {
            self.bridge.notifications().add_listener(event, callback);
        }
        self.listener_count += 1;
        if self.listener_count == 1 {
            Transition::StartObserving
        } else {
            Transition::Unchanged
        }
    }

    /// Removes `count` listeners, saturating at zero.
    pub fn remove_listeners(&mut self, count: usize) -> Transition {
        let before = self.listener_count;
        self.listener_count = before.saturating_sub(count);
        if before > 0 && self.listener_count == 0 {
            Transition::StopObserving
        } else {
            Transition::Unchanged
        }
    }

    /// Removes a host-side callback and one listener.
    pub fn remove_local_listener(&mut self, event: &str, id: ListenerId) -> Transition {
        self.bridge.notifications().remove_listener(event, id);
        self.remove_listeners(1)
    }

    /// Emits `name` to the worker's device event emitter and to host-side
    /// listeners, provided at least one listener is registered.
    pub fn send_event_with_name(&self, name: &str, body: Option<Value>) -> Emission {
        if self.listener_count == 0 {
            warn!("Sending {name} with no listeners registered");
            return Emission::Dropped;
        }

        let local_body = body.clone().unwrap_or(Value::Null);
        let args = match body {
            Some(body) if !body.is_null() => vec![Value::from(name), body],
            _ => vec![Value::from(name)],
        };
        self.bridge.enqueue_js_call(DEVICE_EVENT_EMITTER, "emit", args);
        let local = self.bridge.notifications().emit_event(name, &local_body);
        Emission::Sent { local }
    }
}

/// Modules built on [`EventEmitter`].
pub trait EventEmitterModule: BridgeModule {
    /// The embedded emitter.
    fn emitter(&mut self) -> &mut EventEmitter;

    /// Called when the first listener is added.
    fn start_observing(&mut self) {}

    /// Called when the last listener is removed.
    fn stop_observing(&mut self) {}

    /// Event names this module may emit; empty means unrestricted.
    fn supported_events(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Adds a listener and runs the start-observing hook on the 0 → 1 transition.
pub fn add_listener<T: EventEmitterModule>(module: &mut T, event: &str, callback: Option<Listener>) {
    let supported = module.supported_events();
    if !supported.is_empty() && !supported.contains(&event) {
        warn!("`{event}` is not a supported event of {}", T::CLASS_NAME);
    }
    if module.emitter().add_listener(event, callback) == Transition::StartObserving {
        module.start_observing();
    }
}

/// Removes listeners and runs the stop-observing hook on the → 0 transition.
pub fn remove_listeners<T: EventEmitterModule>(module: &mut T, count: usize) {
    if module.emitter().remove_listeners(count) == Transition::StopObserving {
        module.stop_observing();
    }
}

/// Removes one host-side callback; see [`EventEmitter::remove_local_listener`].
pub fn remove_local_listener<T: EventEmitterModule>(module: &mut T, event: &str, id: ListenerId) {
    if module.emitter().remove_local_listener(event, id) == Transition::StopObserving {
        module.stop_observing();
    }
}

/// The `addListener(eventName)` / `removeListeners(count)` methods exported
/// by every emitter module.
pub fn emitter_methods<T: EventEmitterModule>() -> MethodTable<T> {
    MethodTable::new()
        .method("addListener", add_listener_method::<T>)
        .method("removeListeners", remove_listeners_method::<T>)
}

fn add_listener_method<T: EventEmitterModule>(module: &mut T, args: Args) -> ModuleResult<()> {
    let event: String = args.get(0)?;
    add_listener(module, &event, None);
    Ok(())
}

fn remove_listeners_method<T: EventEmitterModule>(module: &mut T, args: Args) -> ModuleResult<()> {
    let count: f64 = args.get(0)?;
    remove_listeners(module, count.max(0.0) as usize);
    Ok(())
}
