use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bridge_channel::{CallBatch, ModuleConfig, ModuleId};
use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use smallvec::SmallVec;

use crate::builtins;
use crate::error::{WorkerError, WorkerResult};

const TIMING: &str = "Timing";

/// Worker-side function resumed by the host through a callback id.
pub type Callback = Box<dyn FnOnce(&mut JsContext, Vec<Value>) + Send>;

/// Listener for events sent through the device event emitter.
pub type EventHandler = Arc<dyn Fn(&mut JsContext, &Value) + Send + Sync>;

/// Entry point of an application started by `AppRegistry.runApplication`.
pub type AppRunner = Arc<dyn Fn(&mut JsContext, &Value) -> WorkerResult<()> + Send + Sync>;

type TimerCallback = Arc<dyn Fn(&mut JsContext) + Send + Sync>;
type IdleCallback = Box<dyn FnOnce(&mut JsContext, f64) + Send>;

/// A worker-side module the host can call by name.
pub trait JsModule: Send {
    fn call(&mut self, ctx: &mut JsContext, method: &str, args: Vec<Value>) -> WorkerResult<()>;
}

impl<F> JsModule for F
where
    F: FnMut(&mut JsContext, &str, Vec<Value>) -> WorkerResult<()> + Send,
{
    fn call(&mut self, ctx: &mut JsContext, method: &str, args: Vec<Value>) -> WorkerResult<()> {
        self(ctx, method, args)
    }
}

struct PendingCallback {
    callback: Callback,
    partner: u64,
}

struct JsTimer {
    callback: TimerCallback,
    repeats: bool,
}

/// Everything the bundle can reach: host module descriptors, the outgoing
/// call batch and worker-side state the host refers to by id.
pub struct JsContext {
    modules: Vec<ModuleConfig>,
    module_ids: HashMap<String, ModuleId>,
    outgoing: CallBatch,
    progress: Vec<Value>,
    callables: HashMap<String, Box<dyn JsModule>>,
    callbacks: HashMap<u64, PendingCallback>,
    next_callback_id: u64,
    device_listeners: HashMap<String, SmallVec<[EventHandler; 2]>>,
    apps: HashMap<String, AppRunner>,
    timers: HashMap<u64, JsTimer>,
    next_timer_id: u64,
    idle_callbacks: Vec<IdleCallback>,
}

impl Default for JsContext {
    fn default() -> Self {
        Self::new()
    }
}

impl JsContext {
    /// A context with the built-in callable modules and no host modules.
    pub fn new() -> Self {
        let mut ctx = Self {
            modules: Vec::new(),
            module_ids: HashMap::new(),
            outgoing: CallBatch::new(),
            progress: Vec::new(),
            callables: HashMap::new(),
            callbacks: HashMap::new(),
            next_callback_id: 0,
            device_listeners: HashMap::new(),
            apps: HashMap::new(),
            timers: HashMap::new(),
            next_timer_id: 1,
            idle_callbacks: Vec::new(),
        };
        builtins::install(&mut ctx);
        ctx
    }

    /// Replaces the known host modules with the descriptors from the host.
    pub fn load_config(&mut self, modules: Vec<ModuleConfig>) {
        self.module_ids = modules
            .iter()
            .enumerate()
            .map(|(module_id, config)| (config.name.clone(), module_id))
            .collect();
        self.modules = modules;
        debug!("worker knows {} host modules", self.modules.len());
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|config| config.name.as_str())
    }

    pub fn module_config(&self, module: &str) -> Option<&ModuleConfig> {
        self.module_ids
            .get(module)
            .and_then(|&module_id| self.modules.get(module_id))
    }

    /// Constants the host module exported in its descriptor.
    pub fn constants(&self, module: &str) -> Option<&Map<String, Value>> {
        self.module_config(module)?.constants.as_ref()
    }

    fn resolve(&self, module: &str, method: &str) -> WorkerResult<(ModuleId, usize)> {
        let module_id = *self
            .module_ids
            .get(module)
            .ok_or_else(|| WorkerError::UnknownModule(module.to_string()))?;
        let method_id = self.modules[module_id]
            .method_id(method)
            .ok_or_else(|| WorkerError::UnknownMethod {
                module: module.to_string(),
                method: method.to_string(),
            })?;
        Ok((module_id, method_id))
    }

    /// Queues `module.method(...args)` for the next flushed batch.
    pub fn call(&mut self, module: &str, method: &str, args: Vec<Value>) -> WorkerResult<()> {
        let (module_id, method_id) = self.resolve(module, method)?;
        trace!("queue {module}.{method}");
        self.outgoing.push(module_id, method_id, args);
        Ok(())
    }

    /// Like [`call`](Self::call), appending a success and a failure callback id.
    pub fn call_with_callbacks(
        &mut self,
        module: &str,
        method: &str,
        mut args: Vec<Value>,
        on_success: impl FnOnce(&mut JsContext, Vec<Value>) + Send + 'static,
        on_failure: impl FnOnce(&mut JsContext, Vec<Value>) + Send + 'static,
    ) -> WorkerResult<()> {
        let (module_id, method_id) = self.resolve(module, method)?;
        let (success_id, failure_id) = self.register_callbacks(on_success, on_failure);
        args.push(json!(success_id));
        args.push(json!(failure_id));
        self.outgoing.push(module_id, method_id, args);
        Ok(())
    }

    /// Calls a promise method; `resolve` receives the first argument the host
    /// passes back, `reject` the error value.
    pub fn call_promise(
        &mut self,
        module: &str,
        method: &str,
        args: Vec<Value>,
        resolve: impl FnOnce(&mut JsContext, Value) + Send + 'static,
        reject: impl FnOnce(&mut JsContext, Value) + Send + 'static,
    ) -> WorkerResult<()> {
        let (module_id, method_id) = self.resolve(module, method)?;
        if !self.modules[module_id].is_promise(method_id) {
            return Err(WorkerError::NotPromise {
                module: module.to_string(),
                method: method.to_string(),
            });
        }
        self.call_with_callbacks(
            module,
            method,
            args,
            move |ctx, values| resolve(ctx, first(values)),
            move |ctx, values| reject(ctx, first(values)),
        )
    }

    fn register_callbacks(
        &mut self,
        on_success: impl FnOnce(&mut JsContext, Vec<Value>) + Send + 'static,
        on_failure: impl FnOnce(&mut JsContext, Vec<Value>) + Send + 'static,
    ) -> (u64, u64) {
        let success_id = self.next_callback_id;
        let failure_id = success_id + 1;
        self.next_callback_id += 2;
        self.callbacks.insert(
            success_id,
            PendingCallback {
                callback: Box::new(on_success),
                partner: failure_id,
            },
        );
        self.callbacks.insert(
            failure_id,
            PendingCallback {
                callback: Box::new(on_failure),
                partner: success_id,
            },
        );
        (success_id, failure_id)
    }

    /// Callbacks still waiting for the host.
    pub fn pending_callbacks(&self) -> usize {
        self.callbacks.len()
    }

    /// Runs callback `callback_id` and releases its partner.
    pub fn invoke_callback(&mut self, callback_id: u64, args: Vec<Value>) -> WorkerResult<()> {
        let pending = self
            .callbacks
            .remove(&callback_id)
            .ok_or(WorkerError::UnknownCallback(callback_id))?;
        self.callbacks.remove(&pending.partner);
        (pending.callback)(self, args);
        Ok(())
    }

    pub fn register_callable_module(&mut self, name: impl Into<String>, module: impl JsModule + 'static) {
        self.callables.insert(name.into(), Box::new(module));
    }

    /// Invokes a worker-side module on behalf of the host.
    pub fn call_function(&mut self, module: &str, method: &str, args: Vec<Value>) -> WorkerResult<()> {
        let mut callable = self
            .callables
            .remove(module)
            .ok_or_else(|| WorkerError::UnknownCallableModule(module.to_string()))?;
        let result = callable.call(self, method, args);
        // A module may replace itself while running.
        self.callables.entry(module.to_string()).or_insert(callable);
        result
    }

    pub fn add_device_listener(
        &mut self,
        event: impl Into<String>,
        handler: impl Fn(&mut JsContext, &Value) + Send + Sync + 'static,
    ) {
        self.device_listeners
            .entry(event.into())
            .or_default()
            .push(Arc::new(handler));
    }

    pub(crate) fn device_listeners(&self, event: &str) -> SmallVec<[EventHandler; 2]> {
        self.device_listeners.get(event).cloned().unwrap_or_default()
    }

    /// Registers an application for `AppRegistry.runApplication`.
    pub fn register_component(
        &mut self,
        app_key: impl Into<String>,
        runner: impl Fn(&mut JsContext, &Value) -> WorkerResult<()> + Send + Sync + 'static,
    ) {
        self.apps.insert(app_key.into(), Arc::new(runner));
    }

    pub(crate) fn app(&self, app_key: &str) -> Option<AppRunner> {
        self.apps.get(app_key).cloned()
    }

    /// Runs `callback` once after `duration_ms`, timed by the host's timing module.
    pub fn set_timeout(
        &mut self,
        duration_ms: f64,
        callback: impl Fn(&mut JsContext) + Send + Sync + 'static,
    ) -> WorkerResult<u64> {
        self.schedule(duration_ms, false, Arc::new(callback))
    }

    pub fn set_interval(
        &mut self,
        duration_ms: f64,
        callback: impl Fn(&mut JsContext) + Send + Sync + 'static,
    ) -> WorkerResult<u64> {
        self.schedule(duration_ms, true, Arc::new(callback))
    }

    fn schedule(&mut self, duration_ms: f64, repeats: bool, callback: TimerCallback) -> WorkerResult<u64> {
        let timer_id = self.next_timer_id;
        self.call(
            TIMING,
            "createTimer",
            vec![
                json!(timer_id),
                json!(duration_ms),
                json!(scheduling_time_ms()),
                json!(repeats),
            ],
        )?;
        self.next_timer_id += 1;
        self.timers.insert(timer_id, JsTimer { callback, repeats });
        Ok(timer_id)
    }

    pub fn clear_timer(&mut self, timer_id: u64) -> WorkerResult<()> {
        if self.timers.remove(&timer_id).is_some() {
            self.call(TIMING, "deleteTimer", vec![json!(timer_id)])?;
        }
        Ok(())
    }

    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    pub(crate) fn fire_timers(&mut self, timer_ids: &[u64]) {
        for timer_id in timer_ids {
            let Some(timer) = self.timers.get(timer_id) else {
                debug!("timer {timer_id} fired after it was cleared");
                continue;
            };
            let callback = Arc::clone(&timer.callback);
            if !timer.repeats {
                self.timers.remove(timer_id);
            }
            callback(self);
        }
    }

    /// Runs `callback` in the next idle period the host reports.
    pub fn request_idle_callback(
        &mut self,
        callback: impl FnOnce(&mut JsContext, f64) + Send + 'static,
    ) -> WorkerResult<()> {
        if self.idle_callbacks.is_empty() {
            self.call(TIMING, "setSendIdleEvents", vec![json!(true)])?;
        }
        self.idle_callbacks.push(Box::new(callback));
        Ok(())
    }

    pub(crate) fn run_idle_callbacks(&mut self, frame_time_ms: f64) -> WorkerResult<()> {
        let callbacks = std::mem::take(&mut self.idle_callbacks);
        if callbacks.is_empty() {
            return Ok(());
        }
        for callback in callbacks {
            callback(self, frame_time_ms);
        }
        if self.idle_callbacks.is_empty() {
            self.call(TIMING, "setSendIdleEvents", vec![json!(false)])?;
        }
        Ok(())
    }

    /// Queues a progress report for the host's loading view.
    pub fn report_progress(&mut self, progress: Value) {
        self.progress.push(progress);
    }

    /// Native calls buffered since the last flush.
    pub fn pending_calls(&self) -> usize {
        self.outgoing.len()
    }

    pub(crate) fn take_batch(&mut self) -> Option<CallBatch> {
        if self.outgoing.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.outgoing))
        }
    }

    pub(crate) fn take_progress(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.progress)
    }
}

/// Decodes positional argument `index`.
pub(crate) fn arg<T: DeserializeOwned>(args: &[Value], index: usize) -> WorkerResult<T> {
    let value = args.get(index).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|err| WorkerError::InvalidArgument {
        index,
        reason: err.to_string(),
    })
}

fn first(values: Vec<Value>) -> Value {
    values.into_iter().next().unwrap_or(Value::Null)
}

fn scheduling_time_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64() * 1000.0)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> JsContext {
        let mut ctx = JsContext::new();
        ctx.load_config(vec![
            ModuleConfig {
                name: "Timing".into(),
                methods: vec![
                    "createTimer".into(),
                    "deleteTimer".into(),
                    "setSendIdleEvents".into(),
                ],
                ..ModuleConfig::default()
            },
            ModuleConfig {
                name: "ImageLoader".into(),
                methods: vec!["prefetchImage".into()],
                promise_methods: vec![0],
                ..ModuleConfig::default()
            },
        ]);
        ctx
    }

    fn calls(ctx: &mut JsContext) -> Vec<(usize, usize, Vec<Value>)> {
        ctx.take_batch()
            .map(|batch| {
                batch
                    .into_calls()
                    .map(|call| (call.module_id, call.method_id, call.args))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn calls_resolve_names_to_ids() {
        let mut ctx = ctx();
        ctx.call("Timing", "deleteTimer", vec![json!(4)]).expect("call");
        assert_eq!(calls(&mut ctx), vec![(0, 1, vec![json!(4)])]);
        assert!(ctx.take_batch().is_none());

        assert!(matches!(
            ctx.call("Nope", "x", vec![]),
            Err(WorkerError::UnknownModule(name)) if name == "Nope"
        ));
        assert!(matches!(
            ctx.call("Timing", "nope", vec![]),
            Err(WorkerError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn invoking_a_callback_releases_its_partner() {
        let mut ctx = ctx();
        let hits = Arc::new(AtomicUsize::new(0));
        let on_ok = hits.clone();
        ctx.call_promise(
            "ImageLoader",
            "prefetchImage",
            vec![json!("a.png")],
            move |_, _| {
                on_ok.fetch_add(1, Ordering::SeqCst);
            },
            |_, _| panic!("not rejected"),
        )
        .expect("call");
        assert_eq!(
            calls(&mut ctx),
            vec![(1, 0, vec![json!("a.png"), json!(0), json!(1)])]
        );
        assert_eq!(ctx.pending_callbacks(), 2);

        ctx.invoke_callback(0, vec![json!(true)]).expect("resolve");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.pending_callbacks(), 0);
        assert!(matches!(
            ctx.invoke_callback(1, vec![]),
            Err(WorkerError::UnknownCallback(1))
        ));
    }

    #[test]
    fn promise_calls_need_promise_methods() {
        let mut ctx = ctx();
        let err = ctx
            .call_promise("Timing", "deleteTimer", vec![], |_, _| {}, |_, _| {})
            .expect_err("not a promise");
        assert!(matches!(err, WorkerError::NotPromise { .. }));
        assert_eq!(ctx.pending_callbacks(), 0);
    }

    #[test]
    fn timers_fire_until_cleared() {
        let mut ctx = ctx();
        let fired = Arc::new(AtomicUsize::new(0));
        let once = fired.clone();
        let timeout = ctx
            .set_timeout(50.0, move |_| {
                once.fetch_add(1, Ordering::SeqCst);
            })
            .expect("timeout");
        let every = fired.clone();
        let interval = ctx
            .set_interval(10.0, move |_| {
                every.fetch_add(10, Ordering::SeqCst);
            })
            .expect("interval");
        let queued = calls(&mut ctx);
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].2[0], json!(timeout));
        assert_eq!(queued[1].2[3], json!(true));

        ctx.fire_timers(&[timeout, interval]);
        ctx.fire_timers(&[timeout, interval]);
        assert_eq!(fired.load(Ordering::SeqCst), 21);
        assert_eq!(ctx.active_timers(), 1);

        ctx.clear_timer(interval).expect("clear");
        assert_eq!(calls(&mut ctx), vec![(0, 1, vec![json!(interval)])]);
        assert_eq!(ctx.active_timers(), 0);
    }

    #[test]
    fn idle_callbacks_toggle_idle_events() {
        let mut ctx = ctx();
        ctx.request_idle_callback(|_, _| {}).expect("idle");
        ctx.request_idle_callback(|_, _| {}).expect("idle");
        assert_eq!(calls(&mut ctx), vec![(0, 2, vec![json!(true)])]);

        ctx.run_idle_callbacks(12.0).expect("run");
        assert_eq!(calls(&mut ctx), vec![(0, 2, vec![json!(false)])]);
    }
}
