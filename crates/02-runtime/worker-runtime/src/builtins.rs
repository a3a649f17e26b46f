//! Callable modules every worker starts with.

use log::{debug, info};
use serde_json::Value;

use crate::context::{arg, JsContext, JsModule};
use crate::error::{WorkerError, WorkerResult};

pub const DEVICE_EVENT_EMITTER: &str = "RCTDeviceEventEmitter";
pub const APP_REGISTRY: &str = "AppRegistry";
pub const JS_TIMERS: &str = "JSTimers";

pub(crate) fn install(ctx: &mut JsContext) {
    ctx.register_callable_module(DEVICE_EVENT_EMITTER, DeviceEventEmitter);
    ctx.register_callable_module(APP_REGISTRY, AppRegistry);
    ctx.register_callable_module(JS_TIMERS, JsTimers);
}

fn unknown(module: &str, method: &str) -> WorkerError {
    WorkerError::UnknownCallableMethod {
        module: module.to_string(),
        method: method.to_string(),
    }
}

/// `emit(eventName, body?)` fans out to device listeners.
struct DeviceEventEmitter;

impl JsModule for DeviceEventEmitter {
    fn call(&mut self, ctx: &mut JsContext, method: &str, args: Vec<Value>) -> WorkerResult<()> {
        if method != "emit" {
            return Err(unknown(DEVICE_EVENT_EMITTER, method));
        }
        let event: String = arg(&args, 0)?;
        let body = args.get(1).cloned().unwrap_or(Value::Null);
        let listeners = ctx.device_listeners(&event);
        if listeners.is_empty() {
            debug!("device event {event} has no worker listeners");
        }
        for listener in listeners {
            listener(ctx, &body);
        }
        Ok(())
    }
}

/// `runApplication(appKey, {rootTag, initialProps})`.
struct AppRegistry;

impl JsModule for AppRegistry {
    fn call(&mut self, ctx: &mut JsContext, method: &str, args: Vec<Value>) -> WorkerResult<()> {
        if method != "runApplication" {
            return Err(unknown(APP_REGISTRY, method));
        }
        let app_key: String = arg(&args, 0)?;
        let parameters = args.get(1).cloned().unwrap_or(Value::Null);
        let runner = ctx
            .app(&app_key)
            .ok_or_else(|| WorkerError::UnknownApplication(app_key.clone()))?;
        info!("running application {app_key}");
        runner(ctx, &parameters)
    }
}

/// Receives timer and idle notifications from the host timing module.
struct JsTimers;

impl JsModule for JsTimers {
    fn call(&mut self, ctx: &mut JsContext, method: &str, args: Vec<Value>) -> WorkerResult<()> {
        match method {
            "callTimers" => {
                let timer_ids: Vec<u64> = arg(&args, 0)?;
                ctx.fire_timers(&timer_ids);
                Ok(())
            }
            "callIdleCallbacks" => ctx.run_idle_callbacks(arg(&args, 0)?),
            _ => Err(unknown(JS_TIMERS, method)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn emit_reaches_device_listeners() {
        let mut ctx = JsContext::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        ctx.add_device_listener("didUpdateDimensions", move |_, body| {
            assert_eq!(body["window"]["width"], json!(800));
            counter.fetch_add(1, Ordering::SeqCst);
        });

        ctx.call_function(
            DEVICE_EVENT_EMITTER,
            "emit",
            vec![json!("didUpdateDimensions"), json!({"window": {"width": 800}})],
        )
        .expect("emit");
        ctx.call_function(DEVICE_EVENT_EMITTER, "emit", vec![json!("other")])
            .expect("emit without listeners");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn run_application_needs_a_registered_component() {
        let mut ctx = JsContext::new();
        let params = json!({"rootTag": 1, "initialProps": {}});
        assert!(matches!(
            ctx.call_function(APP_REGISTRY, "runApplication", vec![json!("App"), params.clone()]),
            Err(WorkerError::UnknownApplication(key)) if key == "App"
        ));

        let started = Arc::new(AtomicUsize::new(0));
        let counter = started.clone();
        ctx.register_component("App", move |_, parameters| {
            assert_eq!(parameters["rootTag"], json!(1));
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        ctx.call_function(APP_REGISTRY, "runApplication", vec![json!("App"), params])
            .expect("run");
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_methods_are_errors() {
        let mut ctx = JsContext::new();
        assert!(matches!(
            ctx.call_function(JS_TIMERS, "setTimeout", vec![]),
            Err(WorkerError::UnknownCallableMethod { .. })
        ));
        assert!(matches!(
            ctx.call_function("Missing", "x", vec![]),
            Err(WorkerError::UnknownCallableModule(_))
        ));
        // The built-in survives a failed call.
        assert!(ctx.call_function(JS_TIMERS, "callTimers", vec![json!([])]).is_ok());
    }
}
