#![cfg(all(test, not(target_arch = "wasm32")))]
//! Descriptors sent to the worker line up with the tables used for dispatch.

use bridge::{Bridge, BridgeConfig};
use bridge_channel::{pair, Envelope, HostMessage};
use rndom_host::builtin_native_modules;

use crate::support::user_modules;

fn full_bridge() -> Bridge {
    let (host, _worker) = pair();
    let mut classes = builtin_native_modules(true);
    classes.extend(user_modules());
    Bridge::new(BridgeConfig::default().with_dev_mode(true), host, &classes).expect("bridge")
}

#[test]
fn descriptor_positions_match_dispatch_tables() {
    let bridge = full_bridge();
    assert_eq!(bridge.descriptors().len(), bridge.registry().len());

    for (module_id, descriptor) in bridge.descriptors().iter().enumerate() {
        let module = bridge.registry().get(module_id).expect("module");
        assert_eq!(module.name(), descriptor.name);
        assert_eq!(module.method_count(), descriptor.methods.len());
        for (method_id, name) in descriptor.methods.iter().enumerate() {
            assert_eq!(module.method_name(method_id), Some(name.as_str()));
        }
        assert!(descriptor
            .promise_methods
            .iter()
            .all(|&method_id| method_id < descriptor.methods.len()));
        assert!(descriptor.sync_methods.is_empty());
    }
}

#[test]
fn promise_flags_come_from_exported_names() {
    let bridge = full_bridge();
    let promise_methods = |name: &str| {
        let module_id = bridge.registry().module_id(name).expect("registered");
        let descriptor = &bridge.descriptors()[module_id];
        descriptor
            .promise_methods
            .iter()
            .map(|&method_id| descriptor.methods[method_id].clone())
            .collect::<Vec<_>>()
    };

    assert_eq!(promise_methods("ImageLoader"), ["prefetchImage"]);
    assert_eq!(promise_methods("KeyValueStore"), ["getItem"]);
    assert!(promise_methods("Timing").is_empty());
    assert!(promise_methods("DeviceInfo").is_empty());
}

#[test]
fn config_payload_survives_the_wire() {
    let bridge = full_bridge();
    let message = HostMessage::LoadBridgeConfig(bridge.bridge_config_payload());
    let frame = message
        .to_envelope()
        .and_then(|envelope| envelope.encode())
        .expect("encode");

    let decoded = HostMessage::from_envelope(Envelope::decode(&frame).expect("decode"))
        .expect("known topic");
    let HostMessage::LoadBridgeConfig(payload) = decoded else {
        panic!("expected loadBridgeConfig");
    };
    assert_eq!(payload.config, bridge.descriptors());
    let constants = payload.config[1].constants.as_ref().expect("device info constants");
    assert!(constants.contains_key("Dimensions"));
}
