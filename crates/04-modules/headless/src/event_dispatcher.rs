use module_abi::{BridgeHandle, BridgeModule, MethodTable, Value};
use serde_json::json;

/// Worker entry point for view events.
pub const RECEIVE_EVENT: &str = "RCTEventEmitter.receiveEvent";

/// Forwards host-originated view events to the worker.
pub struct EventDispatcher {
    bridge: BridgeHandle,
    sent: u64,
}

impl EventDispatcher {
    /// Sends `[reactTag, eventName, body]` to the worker's event emitter.
    pub fn send_event(&mut self, react_tag: u64, event_name: &str, body: Option<Value>) {
        let body = body.unwrap_or(Value::Null);
        self.bridge.enqueue_js_call_with_dot_method(
            RECEIVE_EVENT,
            vec![json!(react_tag), json!(event_name), body],
        );
        self.sent += 1;
    }

    pub fn events_sent(&self) -> u64 {
        self.sent
    }
}

impl BridgeModule for EventDispatcher {
    const CLASS_NAME: &'static str = "RCTEventDispatcher";

    fn new(bridge: BridgeHandle) -> Self {
        Self { bridge, sent: 0 }
    }

    fn methods() -> MethodTable<Self> {
        MethodTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{module, next_message};
    use bridge_channel::HostMessage;

    #[test]
    fn forwards_events_to_receive_event() {
        let (mut dispatcher, worker) = module::<EventDispatcher>();
        dispatcher.send_event(11, "topPress", Some(json!({"x": 4})));
        dispatcher.send_event(12, "topBlur", None);

        assert_eq!(
            next_message(&worker),
            Some(HostMessage::CallFunction {
                module: "RCTEventEmitter".into(),
                method: "receiveEvent".into(),
                args: vec![json!(11), json!("topPress"), json!({"x": 4})],
            })
        );
        assert_eq!(
            next_message(&worker),
            Some(HostMessage::CallFunction {
                module: "RCTEventEmitter".into(),
                method: "receiveEvent".into(),
                args: vec![json!(12), json!("topBlur"), Value::Null],
            })
        );
        assert_eq!(dispatcher.events_sent(), 2);
    }
}
