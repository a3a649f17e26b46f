use log::{debug, info};
use module_abi::{Args, BridgeHandle, BridgeModule, BridgeSignal, MethodTable, ModuleResult, Value};

/// Loading banner shown while the bundle is fetched and evaluated.
pub struct DevLoadingView {
    _bridge: BridgeHandle,
    message: Option<String>,
    progress: Option<Value>,
}

impl DevLoadingView {
    pub fn show_message(&mut self, message: String) {
        info!("loading: {message}");
        self.message = Some(message);
    }

    pub fn hide(&mut self) {
        self.message = None;
    }

    pub fn update_progress(&mut self, progress: Value) {
        debug!("load progress {progress}");
        self.progress = Some(progress);
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn progress(&self) -> Option<&Value> {
        self.progress.as_ref()
    }
}

impl BridgeModule for DevLoadingView {
    const CLASS_NAME: &'static str = "RCTDevLoadingView";

    fn new(bridge: BridgeHandle) -> Self {
        Self {
            _bridge: bridge,
            message: None,
            progress: None,
        }
    }

    fn methods() -> MethodTable<Self> {
        MethodTable::new()
            .method("showMessage", show_message)
            .method("hide", |view, _args| {
                view.hide();
                Ok(())
            })
    }

    fn handle_signal(&mut self, signal: &BridgeSignal) {
        match signal {
            BridgeSignal::UpdateProgress(progress) => self.update_progress(progress.clone()),
            BridgeSignal::JavaScriptDidLoad => self.hide(),
            _ => {}
        }
    }
}

// `showMessage(message, color, backgroundColor)`; colours are ignored.
fn show_message(view: &mut DevLoadingView, args: Args) -> ModuleResult<()> {
    view.show_message(args.get(0)?);
    Ok(())
}

/// Developer toggles the worker can flip at runtime.
pub struct DevSettings {
    _bridge: BridgeHandle,
    hot_loading_enabled: bool,
    reload_requested: bool,
}

impl DevSettings {
    pub fn hot_loading_enabled(&self) -> bool {
        self.hot_loading_enabled
    }

    pub fn set_hot_loading_enabled(&mut self, enabled: bool) {
        self.hot_loading_enabled = enabled;
    }

    pub fn reload(&mut self) {
        info!("reload requested");
        self.reload_requested = true;
    }

    /// Clears and returns a pending reload request.
    pub fn take_reload_request(&mut self) -> bool {
        std::mem::take(&mut self.reload_requested)
    }
}

impl BridgeModule for DevSettings {
    const CLASS_NAME: &'static str = "RCTDevSettings";

    fn new(bridge: BridgeHandle) -> Self {
        Self {
            _bridge: bridge,
            hot_loading_enabled: false,
            reload_requested: false,
        }
    }

    fn methods() -> MethodTable<Self> {
        MethodTable::<Self>::new()
            .method("reload", |settings, _args| {
                settings.reload();
                Ok(())
            })
            .method("setHotLoadingEnabled", |settings, args| {
                settings.set_hot_loading_enabled(args.get(0)?);
                Ok(())
            })
    }
}
