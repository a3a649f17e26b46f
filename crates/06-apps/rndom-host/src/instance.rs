use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use bridge::{Bridge, BridgeConfig, FrameReport};
use bridge_channel::pair;
use log::{debug, info};
use module_abi::{BridgeModule, BridgeSignal, Clock, ModuleClass, SystemClock, Value};
use modules_device_info::{DeviceInfo, DisplayMetrics};
use modules_headless::{
    DevLoadingView, DevSettings, EventDispatcher, ImageLoader, UiManager,
};
use modules_platform::PlatformConstants;
use modules_timing::Timing;
use serde_json::json;
use worker_runtime::{BundleRegistry, WorkerThread, APP_REGISTRY};

/// Tag of the single root view an instance renders into.
pub const ROOT_TAG: u64 = 1;

/// Module classes every instance registers, in registration order.
pub fn builtin_native_modules(dev_mode: bool) -> Vec<ModuleClass> {
    let mut classes = vec![
        ModuleClass::of::<EventDispatcher>(),
        ModuleClass::of::<DeviceInfo>(),
        ModuleClass::of::<PlatformConstants>(),
        ModuleClass::of::<Timing>(),
        ModuleClass::of::<UiManager>(),
        ModuleClass::of::<ImageLoader>(),
    ];
    if dev_mode {
        classes.push(ModuleClass::of::<DevLoadingView>());
        classes.push(ModuleClass::of::<DevSettings>());
    }
    classes
}

pub struct InstanceOptions {
    pub enable_hot_reload: bool,
    pub dev_mode: bool,
    /// Appended after the built-in modules.
    pub native_modules: Vec<ModuleClass>,
    pub initial_props: Value,
    pub clock: Arc<dyn Clock>,
}

impl Default for InstanceOptions {
    fn default() -> Self {
        Self {
            enable_hot_reload: false,
            dev_mode: false,
            native_modules: Vec::new(),
            initial_props: json!({}),
            clock: Arc::new(SystemClock),
        }
    }
}

/// One running application: a bridge plus the worker thread it talks to.
pub struct Instance {
    bridge: Bridge,
    worker: WorkerThread,
    clock: Arc<dyn Clock>,
    initial_props: Value,
    app_started: bool,
    frames: u64,
}

impl Instance {
    /// Builds the bridge, then starts the worker. A registration error means
    /// no worker is ever started.
    pub fn new(
        bundle: impl Into<String>,
        module_name: impl Into<String>,
        options: InstanceOptions,
        bundles: BundleRegistry,
    ) -> Result<Self> {
        let config = BridgeConfig::new(module_name, bundle).with_dev_mode(options.dev_mode);
        let mut classes = builtin_native_modules(options.dev_mode);
        classes.extend(options.native_modules);

        let (host, worker_port) = pair();
        let mut bridge = Bridge::builder(config)
            .modules(classes)
            .clock(Arc::clone(&options.clock))
            .build(host)
            .context("failed to build bridge")?;
        if let Some(settings) = bridge.module_for_class_mut::<DevSettings>() {
            settings.set_hot_loading_enabled(options.enable_hot_reload);
        }

        let worker = worker_runtime::spawn(worker_port, bundles).context("failed to start worker")?;
        Ok(Self {
            bridge,
            worker,
            clock: options.clock,
            initial_props: options.initial_props,
            app_started: false,
            frames: 0,
        })
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut Bridge {
        &mut self.bridge
    }

    pub fn module<T: BridgeModule>(&self) -> Option<&T> {
        self.bridge.module_for_class::<T>()
    }

    pub fn module_mut<T: BridgeModule>(&mut self) -> Option<&mut T> {
        self.bridge.module_for_class_mut::<T>()
    }

    pub fn app_started(&self) -> bool {
        self.app_started
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Sends the bridge configuration to the worker.
    pub fn start(&mut self) -> Result<()> {
        self.bridge
            .load_bridge_config()
            .context("failed to send bridge config")
    }

    /// Handles worker traffic until the bundle has loaded.
    pub fn wait_for_load(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while self.bridge.is_loading() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                bail!(
                    "bundle {} did not load within {timeout:?}",
                    self.bridge.config().bundle_location
                );
            }
            self.bridge.pump_blocking(remaining)?;
        }
        self.run_application();
        Ok(())
    }

    fn run_application(&mut self) {
        if self.app_started || self.bridge.is_loading() {
            return;
        }
        self.app_started = true;
        let module_name = self.bridge.config().module_name.clone();
        info!("starting {module_name} in root {ROOT_TAG}");
        self.bridge.enqueue_js_call(
            APP_REGISTRY,
            "runApplication",
            vec![
                json!(module_name),
                json!({"rootTag": ROOT_TAG, "initialProps": self.initial_props}),
            ],
        );
    }

    /// One rendering tick at `now_ms`.
    pub fn run_frame(&mut self, now_ms: f64) -> Result<FrameReport> {
        self.bridge.pump()?;
        self.run_application();
        if let Some(ui) = self.bridge.module_for_class_mut::<UiManager>() {
            ui.take_tick_request();
        }

        let report = self.bridge.frame();
        self.bridge.broadcast_signal(&BridgeSignal::Frame { now_ms });
        self.bridge.broadcast_signal(&BridgeSignal::Idle {
            frame_start_ms: now_ms,
            now_ms: self.clock.now_ms(),
        });
        self.frames += 1;
        Ok(report)
    }

    /// Runs frames until nothing is queued, no tick is requested and no
    /// module wants frames, waiting up to `pacing` for worker traffic
    /// before each one. Returns the number of frames run.
    pub fn run_until_idle(&mut self, max_frames: usize, pacing: Duration) -> Result<usize> {
        for frame in 0..max_frames {
            self.bridge.pump_blocking(pacing)?;
            self.run_application();
            if !self.bridge.should_continue() {
                debug!("idle after {frame} frames");
                return Ok(frame);
            }
            self.run_frame(self.clock.now_ms())?;
        }
        Ok(max_frames)
    }

    pub fn update_dimensions(&mut self, metrics: DisplayMetrics) {
        if let Some(device_info) = self.bridge.module_for_class_mut::<DeviceInfo>() {
            device_info.update_dimensions(metrics);
        }
    }

    /// Forwards a view event to the worker.
    pub fn send_event(&mut self, react_tag: u64, event_name: &str, body: Option<Value>) {
        if let Some(dispatcher) = self.bridge.module_for_class_mut::<EventDispatcher>() {
            dispatcher.send_event(react_tag, event_name, body);
        }
    }

    /// Closes the channel and waits for the worker to exit.
    pub fn shutdown(self) -> Result<()> {
        let Instance { bridge, worker, .. } = self;
        drop(bridge);
        worker.join().context("worker exited with an error")
    }
}
