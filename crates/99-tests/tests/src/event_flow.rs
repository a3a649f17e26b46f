#![cfg(all(test, not(target_arch = "wasm32")))]
//! Host-originated events reaching worker listeners.

use modules_device_info::{DeviceInfo, DisplayMetrics};
use rndom_host::{InstanceOptions, ROOT_TAG};
use serde_json::{json, Value};
use worker_runtime::{BundleRegistry, JsContext, WorkerError, WorkerResult};

use crate::support::{records, started, APP, BUNDLE, PACING};

fn listening_bundle() -> BundleRegistry {
    BundleRegistry::new().with(BUNDLE, |ctx: &mut JsContext| -> WorkerResult<()> {
        ctx.add_device_listener("didUpdateDimensions", |ctx, body| {
            let _ = ctx.call("Probe", "record", vec![body["window"]["width"].clone()]);
        });
        ctx.register_callable_module(
            "RCTEventEmitter",
            |ctx: &mut JsContext, method: &str, args: Vec<Value>| -> WorkerResult<()> {
                if method != "receiveEvent" {
                    return Err(WorkerError::UnknownCallableMethod {
                        module: "RCTEventEmitter".into(),
                        method: method.into(),
                    });
                }
                ctx.call("Probe", "record", vec![json!([args[0], args[1]])])
            },
        );
        ctx.register_component(APP, |ctx, parameters| {
            ctx.call("Probe", "record", vec![parameters["rootTag"].clone()])
        });
        Ok(())
    })
}

#[test]
fn dimension_updates_reach_worker_listeners() {
    let mut instance = started(listening_bundle(), InstanceOptions::default());
    instance.run_until_idle(20, PACING).expect("run");
    assert_eq!(records(&instance), vec![json!(ROOT_TAG)]);

    instance.update_dimensions(DisplayMetrics {
        inner_width: 1024.4,
        inner_height: 768.0,
        ..DisplayMetrics::default()
    });
    instance.run_until_idle(20, PACING).expect("run");

    assert_eq!(records(&instance), vec![json!(ROOT_TAG), json!(1025.0)]);
    let device_info = instance.module::<DeviceInfo>().expect("device info");
    assert_eq!(device_info.metrics().inner_width, 1024.4);
    instance.shutdown().expect("shutdown");
}

#[test]
fn view_events_go_through_receive_event() {
    let mut instance = started(listening_bundle(), InstanceOptions::default());
    instance.send_event(42, "topPress", Some(json!({"x": 1})));
    instance.send_event(43, "topFocus", None);
    instance.run_until_idle(20, PACING).expect("run");

    let records = records(&instance);
    assert!(records.contains(&json!([42, "topPress"])));
    assert!(records.contains(&json!([43, "topFocus"])));
    assert_eq!(instance.bridge().stats().failed, 0);
    instance.shutdown().expect("shutdown");
}
