use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use bridge_channel::{
    ChannelError, ChannelResult, Envelope, HostMessage, HostPort, LoadBridgeConfig, ModuleConfig,
    NativeCall, WorkerMessage,
};
use log::{debug, error, info, trace, warn};
use module_abi::{
    BridgeHandle, BridgeModule, BridgeSignal, Clock, JsCallback, ModuleClass, NativeModule,
    NotificationCenter, SystemClock, Value, JAVASCRIPT_DID_LOAD,
};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult, DispatchError};
use crate::registry::ModuleRegistry;
use crate::stats::BridgeStats;
use crate::well_known::{names, WellKnownModules};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeState {
    /// Waiting for the worker to evaluate the bundle.
    Loading,
    Running,
}

/// Outcome of one [`Bridge::frame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub dispatched: usize,
    pub failed: usize,
}

type LoadCallback = Box<dyn FnOnce() + Send>;

pub struct BridgeBuilder {
    config: BridgeConfig,
    classes: Vec<ModuleClass>,
    clock: Arc<dyn Clock>,
    notifications: NotificationCenter,
}

impl BridgeBuilder {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            classes: Vec::new(),
            clock: Arc::new(SystemClock),
            notifications: NotificationCenter::new(),
        }
    }

    pub fn module(mut self, class: ModuleClass) -> Self {
        self.classes.push(class);
        self
    }

    pub fn modules(mut self, classes: impl IntoIterator<Item = ModuleClass>) -> Self {
        self.classes.extend(classes);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn notifications(mut self, notifications: NotificationCenter) -> Self {
        self.notifications = notifications;
        self
    }

    /// Registers every module and resolves the well-known ones. Nothing is
    /// sent to the worker yet.
    pub fn build(self, port: HostPort) -> BridgeResult<Bridge> {
        let handle = BridgeHandle::new(port.outbound(), self.notifications, self.clock);
        let registry = ModuleRegistry::build(&self.classes, &handle)?;
        let well_known = WellKnownModules::resolve(&registry, self.config.dev_mode)?;
        Ok(Bridge {
            config: self.config,
            port,
            handle,
            registry,
            well_known,
            queue: Vec::new(),
            state: BridgeState::Loading,
            config_sent: false,
            on_load: None,
            stats: BridgeStats::default(),
        })
    }
}

/// Host-side bridge state: registry, pending calls and the worker channel.
pub struct Bridge {
    config: BridgeConfig,
    port: HostPort,
    handle: BridgeHandle,
    registry: ModuleRegistry,
    well_known: WellKnownModules,
    queue: Vec<NativeCall>,
    state: BridgeState,
    config_sent: bool,
    on_load: Option<LoadCallback>,
    stats: BridgeStats,
}

impl Bridge {
    pub fn builder(config: BridgeConfig) -> BridgeBuilder {
        BridgeBuilder::new(config)
    }

    pub fn new(config: BridgeConfig, port: HostPort, classes: &[ModuleClass]) -> BridgeResult<Self> {
        BridgeBuilder::new(config)
            .modules(classes.iter().copied())
            .build(port)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == BridgeState::Loading
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    pub fn handle(&self) -> &BridgeHandle {
        &self.handle
    }

    pub fn notifications(&self) -> &NotificationCenter {
        self.handle.notifications()
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn descriptors(&self) -> &[ModuleConfig] {
        self.registry.descriptors()
    }

    pub fn well_known(&self) -> &WellKnownModules {
        &self.well_known
    }

    /// Calls accepted from the worker and not yet dispatched.
    pub fn pending_calls(&self) -> &[NativeCall] {
        &self.queue
    }

    /// Runs once, when the worker reports the bundle as loaded.
    pub fn set_bundle_finished_loading(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.on_load = Some(Box::new(callback));
    }

    /// The `loadBridgeConfig` payload for this registry.
    pub fn bridge_config_payload(&self) -> LoadBridgeConfig {
        LoadBridgeConfig {
            config: self.registry.descriptors().to_vec(),
            bundle: self.config.bundle_location.clone(),
        }
    }

    /// Sends the module descriptors and bundle location. Allowed once.
    pub fn load_bridge_config(&mut self) -> BridgeResult<()> {
        if self.config_sent {
            return Err(BridgeError::ConfigAlreadySent);
        }
        let message = HostMessage::LoadBridgeConfig(self.bridge_config_payload());
        self.port.send(&message)?;
        self.config_sent = true;
        info!(
            "sent bridge config: {} modules, bundle {}",
            self.registry.len(),
            self.config.bundle_location
        );
        Ok(())
    }

    /// Fire-and-forget send to the worker.
    pub fn send_message(&self, message: &HostMessage) {
        self.handle.send_message(message);
    }

    pub fn enqueue_js_call(&self, module: &str, method: &str, args: Vec<Value>) {
        self.handle.enqueue_js_call(module, method, args);
    }

    pub fn enqueue_js_call_with_dot_method(&self, module_dot_method: &str, args: Vec<Value>) {
        self.handle
            .enqueue_js_call_with_dot_method(module_dot_method, args);
    }

    pub fn enqueue_js_callback(&self, callback_id: u64, args: Vec<Value>) {
        self.handle.enqueue_js_callback(callback_id, args);
    }

    pub fn callback_from_id(&self, callback_id: u64) -> JsCallback {
        self.handle.callback_from_id(callback_id)
    }

    /// Handles every inbound frame that is already waiting. Returns how many
    /// were handled.
    pub fn pump(&mut self) -> BridgeResult<usize> {
        let mut handled = 0;
        while let Some(frame) = self.port.try_recv()? {
            self.on_message(&frame);
            handled += 1;
        }
        Ok(handled)
    }

    /// Waits up to `timeout` for one frame, then drains the rest.
    pub fn pump_blocking(&mut self, timeout: Duration) -> BridgeResult<usize> {
        match self.port.recv_timeout(timeout)? {
            Some(frame) => {
                self.on_message(&frame);
                Ok(1 + self.pump()?)
            }
            None => Ok(0),
        }
    }

    /// Handles one inbound frame. Unknown or malformed frames are logged and
    /// dropped; returns whether the frame was accepted.
    pub fn on_message(&mut self, frame: &str) -> bool {
        self.stats.inbound += 1;
        let accepted = match decode_worker_message(frame) {
            Ok(message) => {
                self.handle_worker_message(message);
                true
            }
            Err(err) => {
                warn!("dropping inbound message: {err}");
                self.stats.dropped += 1;
                false
            }
        };

        if !self.queue.is_empty() {
            self.signal(self.well_known.ui_manager, &BridgeSignal::RequestTick);
        }
        accepted
    }

    fn handle_worker_message(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::BundleFinishedLoading => self.finish_loading(),
            WorkerMessage::FlushedQueue(batch) => {
                trace!("queued {} native calls", batch.len());
                self.stats.queued += batch.len() as u64;
                self.queue.extend(batch.into_calls());
            }
            WorkerMessage::UpdateProgress(progress) => match self.well_known.dev_loading_view {
                Some(module_id) => self.signal(module_id, &BridgeSignal::UpdateProgress(progress)),
                None => debug!("load progress {progress} (no {})", names::DEV_LOADING_VIEW),
            },
        }
    }

    fn finish_loading(&mut self) {
        if self.state == BridgeState::Running {
            debug!("duplicate bundleFinishedLoading ignored");
            return;
        }
        self.state = BridgeState::Running;
        info!("bundle {} finished loading", self.config.bundle_location);
        self.handle
            .notifications()
            .emit_event(JAVASCRIPT_DID_LOAD, &Value::Null);
        self.broadcast_signal(&BridgeSignal::JavaScriptDidLoad);
        if let Some(callback) = self.on_load.take() {
            callback();
        }
    }

    /// Asks the worker to flush, then dispatches every call queued so far in
    /// arrival order. Calls that arrive during dispatch wait for the next frame.
    pub fn frame(&mut self) -> FrameReport {
        self.send_message(&HostMessage::Flush);
        let calls = std::mem::take(&mut self.queue);

        let mut report = FrameReport::default();
        for call in calls {
            match self.dispatch_isolated(call) {
                Ok(()) => report.dispatched += 1,
                Err(err) => {
                    error!("native call failed: {err}");
                    report.failed += 1;
                }
            }
        }

        self.stats.frames += 1;
        self.stats.dispatched += report.dispatched as u64;
        self.stats.failed += report.failed as u64;
        report
    }

    /// A panicking method counts as a failed call; the rest of the frame
    /// still runs.
    fn dispatch_isolated(&mut self, call: NativeCall) -> Result<(), DispatchError> {
        let (module_id, method_id) = (call.module_id, call.method_id);
        panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(call))).unwrap_or_else(|_| {
            let module = self.registry.get(module_id);
            Err(DispatchError::Panicked {
                module: module.map_or_else(|| "?".into(), |m| m.name().to_string()),
                method: module
                    .and_then(|m| m.method_name(method_id))
                    .unwrap_or("?")
                    .to_string(),
                method_id,
            })
        })
    }

    fn dispatch(&mut self, call: NativeCall) -> Result<(), DispatchError> {
        let NativeCall {
            module_id,
            method_id,
            args,
        } = call;
        let module = self
            .registry
            .get_mut(module_id)
            .ok_or(DispatchError::UnknownModule { module_id })?;
        trace!(
            "dispatch {}.{}",
            module.name(),
            module.method_name(method_id).unwrap_or("?")
        );
        module
            .invoke(method_id, args)
            .map_err(|source| DispatchError::Call {
                module: module.name().to_string(),
                method: module.method_name(method_id).unwrap_or("?").to_string(),
                method_id,
                source,
            })
    }

    /// Whether another frame is needed: calls are queued or a module asked
    /// for frames.
    pub fn should_continue(&self) -> bool {
        !self.queue.is_empty() || self.modules_want_frame()
    }

    pub fn modules_want_frame(&self) -> bool {
        self.registry.iter().any(|module| module.wants_frame())
    }

    pub fn broadcast_signal(&mut self, signal: &BridgeSignal) {
        for module in self.registry.iter_mut() {
            module.handle_signal(signal);
        }
    }

    fn signal(&mut self, module_id: usize, signal: &BridgeSignal) {
        if let Some(module) = self.registry.get_mut(module_id) {
            module.handle_signal(signal);
        }
    }

    pub fn module_for_class<T: BridgeModule>(&self) -> Option<&T> {
        self.registry.module_for_class::<T>()
    }

    pub fn module_for_class_mut<T: BridgeModule>(&mut self) -> Option<&mut T> {
        self.registry.module_for_class_mut::<T>()
    }

    fn well_known_module(&self, module_id: usize) -> &dyn NativeModule {
        self.registry.module(module_id)
    }

    pub fn ui_manager(&self) -> &dyn NativeModule {
        self.well_known_module(self.well_known.ui_manager)
    }

    pub fn event_dispatcher(&self) -> &dyn NativeModule {
        self.well_known_module(self.well_known.event_dispatcher)
    }

    pub fn image_loader(&self) -> &dyn NativeModule {
        self.well_known_module(self.well_known.image_loader)
    }

    pub fn device_info(&self) -> &dyn NativeModule {
        self.well_known_module(self.well_known.device_info)
    }

    pub fn dev_loading_view(&self) -> BridgeResult<&dyn NativeModule> {
        self.well_known
            .dev_loading_view
            .map(|module_id| self.well_known_module(module_id))
            .ok_or(BridgeError::MissingModule {
                name: names::DEV_LOADING_VIEW,
            })
    }

    pub fn dev_settings(&self) -> BridgeResult<&dyn NativeModule> {
        self.well_known
            .dev_settings
            .map(|module_id| self.well_known_module(module_id))
            .ok_or(BridgeError::MissingModule {
                name: names::DEV_SETTINGS,
            })
    }
}

fn decode_worker_message(frame: &str) -> ChannelResult<WorkerMessage> {
    let envelope = Envelope::decode(frame)?;
    WorkerMessage::from_envelope(envelope).map_err(ChannelError::from)
}
