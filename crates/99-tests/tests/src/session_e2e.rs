#![cfg(all(test, not(target_arch = "wasm32")))]
//! Whole sessions: handshake, application start, promise round trips and
//! timers driven by a manual clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use module_abi::{Clock, ManualClock};
use modules_timing::Timing;
use parking_lot::Mutex;
use rndom_host::InstanceOptions;
use serde_json::{json, Value};
use worker_runtime::{BundleRegistry, JsContext, WorkerResult};

use crate::support::{records, started, RCTKeyValueStore, APP, BUNDLE, PACING};

fn bundle(app: impl Fn(&mut JsContext, &Value) -> WorkerResult<()> + Send + Sync + Clone + 'static) -> BundleRegistry {
    BundleRegistry::new().with(BUNDLE, move |ctx: &mut JsContext| -> WorkerResult<()> {
        ctx.register_component(APP, app.clone());
        Ok(())
    })
}

#[test]
fn promise_round_trip_reaches_the_worker_and_back() {
    let mut instance = started(
        bundle(|ctx, _| {
            ctx.call("KeyValueStore", "setItem", vec![json!("greeting"), json!("hello")])?;
            ctx.call_promise(
                "KeyValueStore",
                "getItem",
                vec![json!("greeting")],
                |ctx, value| {
                    let _ = ctx.call("Probe", "record", vec![json!({"resolved": value})]);
                },
                |ctx, err| {
                    let _ = ctx.call("Probe", "record", vec![json!({"rejected": err})]);
                },
            )?;
            ctx.call_promise(
                "KeyValueStore",
                "getItem",
                vec![json!("missing")],
                |_, _| {},
                |ctx, err| {
                    let _ = ctx.call("Probe", "record", vec![json!({"rejected": err["message"]})]);
                },
            )
        }),
        InstanceOptions::default(),
    );

    instance.run_until_idle(100, PACING).expect("run");

    let store = instance.module::<RCTKeyValueStore>().expect("store");
    assert_eq!(store.item("greeting"), Some(&json!("hello")));
    assert_eq!(
        records(&instance),
        vec![
            json!({"resolved": "hello"}),
            json!({"rejected": "no item missing"}),
        ]
    );
    let stats = instance.bridge().stats();
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.dispatched, 5);
    instance.shutdown().expect("shutdown");
}

#[test]
fn interval_fires_on_frames_until_cleared() {
    let clock = ManualClock::new(1_000.0);
    let ticks = Arc::new(AtomicUsize::new(0));
    let timer_id = Arc::new(Mutex::new(None));

    let app_ticks = ticks.clone();
    let app_timer = timer_id.clone();
    let mut instance = started(
        bundle(move |ctx, _| {
            let ticks = app_ticks.clone();
            let timer = app_timer.clone();
            let id = ctx.set_interval(100.0, move |ctx| {
                let n = ticks.fetch_add(1, Ordering::SeqCst) + 1;
                let _ = ctx.call("Probe", "record", vec![json!(n)]);
                if n == 3 {
                    if let Some(id) = *timer.lock() {
                        let _ = ctx.clear_timer(id);
                    }
                }
            })?;
            *app_timer.lock() = Some(id);
            Ok(())
        }),
        InstanceOptions {
            clock: Arc::new(clock.clone()),
            ..InstanceOptions::default()
        },
    );

    // Deliver the createTimer call.
    instance.run_until_idle(10, PACING).expect("run");
    assert_eq!(instance.module::<Timing>().expect("timing").timer_count(), 1);
    assert_eq!(ticks.load(Ordering::SeqCst), 0);

    for _ in 0..200 {
        clock.advance(16.0);
        instance
            .bridge_mut()
            .pump_blocking(Duration::from_millis(20))
            .expect("pump");
        instance.run_frame(clock.now_ms()).expect("frame");
        if instance.module::<Timing>().expect("timing").timer_count() == 0 {
            break;
        }
    }
    instance.run_until_idle(10, PACING).expect("settle");

    assert_eq!(ticks.load(Ordering::SeqCst), 3);
    assert_eq!(records(&instance), vec![json!(1), json!(2), json!(3)]);
    assert!(!instance.bridge().should_continue());
    instance.shutdown().expect("shutdown");
}
