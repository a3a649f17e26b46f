//! A small bundle exercising the built-in modules, used by `rndom demo`.

use log::{debug, info, warn};
use serde_json::{json, Value};
use worker_runtime::{BundleRegistry, JsContext, WorkerResult};

pub const DEMO_BUNDLE: &str = "demo.bundle";
pub const DEMO_APP: &str = "DemoApp";

/// Timer ticks the demo app schedules before going idle.
pub const COUNTDOWN: u32 = 3;

pub fn bundles() -> BundleRegistry {
    BundleRegistry::new().with(DEMO_BUNDLE, evaluate)
}

fn evaluate(ctx: &mut JsContext) -> WorkerResult<()> {
    ctx.report_progress(json!({"done": 1, "total": 1}));
    let window = ctx
        .constants("DeviceInfo")
        .and_then(|constants| constants.get("Dimensions"))
        .map(|dimensions| dimensions["window"].clone())
        .unwrap_or(Value::Null);
    info!("demo bundle sees window {window}");

    ctx.add_device_listener("didUpdateDimensions", |_, body| {
        info!("dimensions changed: {body}");
    });
    ctx.register_component(DEMO_APP, run);
    Ok(())
}

fn run(ctx: &mut JsContext, parameters: &Value) -> WorkerResult<()> {
    info!("{DEMO_APP} mounted in root {}", parameters["rootTag"]);
    ctx.call("DeviceInfo", "addListener", vec![json!("didUpdateDimensions")])?;
    countdown(ctx, COUNTDOWN)?;
    ctx.call_promise(
        "ImageLoader",
        "prefetchImage",
        vec![json!("https://example.com/logo.png")],
        |_, _| info!("logo prefetched"),
        |_, err| warn!("prefetch rejected: {err}"),
    )?;
    ctx.request_idle_callback(|_, frame_time| debug!("idle callback at {frame_time}"))
}

fn countdown(ctx: &mut JsContext, remaining: u32) -> WorkerResult<()> {
    if remaining == 0 {
        info!("countdown finished");
        return Ok(());
    }
    ctx.set_timeout(20.0, move |ctx| {
        debug!("countdown {remaining}");
        if let Err(err) = countdown(ctx, remaining - 1) {
            warn!("countdown stopped: {err}");
        }
    })?;
    Ok(())
}
