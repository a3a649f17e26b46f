use bridge_channel::ModuleId;

use crate::error::{BridgeError, BridgeResult};
use crate::registry::ModuleRegistry;

/// Names the bridge resolves after registration.
pub mod names {
    pub const UI_MANAGER: &str = "UIManager";
    pub const EVENT_DISPATCHER: &str = "EventDispatcher";
    pub const IMAGE_LOADER: &str = "ImageLoader";
    pub const DEVICE_INFO: &str = "DeviceInfo";
    pub const DEV_LOADING_VIEW: &str = "DevLoadingView";
    pub const DEV_SETTINGS: &str = "DevSettings";
}

/// Resolved ids of the modules the bridge itself talks to.
///
/// The UI manager, event dispatcher, image loader and device info are always
/// required; the dev tooling modules only when `dev_mode` is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WellKnownModules {
    pub ui_manager: ModuleId,
    pub event_dispatcher: ModuleId,
    pub image_loader: ModuleId,
    pub device_info: ModuleId,
    pub dev_loading_view: Option<ModuleId>,
    pub dev_settings: Option<ModuleId>,
}

impl WellKnownModules {
    pub fn resolve(registry: &ModuleRegistry, dev_mode: bool) -> BridgeResult<Self> {
        let require = |name: &'static str| {
            registry
                .module_id(name)
                .ok_or(BridgeError::MissingModule { name })
        };
        let dev_tool = |name: &'static str| {
            if dev_mode {
                require(name).map(Some)
            } else {
                Ok(registry.module_id(name))
            }
        };

        Ok(Self {
            ui_manager: require(names::UI_MANAGER)?,
            event_dispatcher: require(names::EVENT_DISPATCHER)?,
            image_loader: require(names::IMAGE_LOADER)?,
            device_info: require(names::DEVICE_INFO)?,
            dev_loading_view: dev_tool(names::DEV_LOADING_VIEW)?,
            dev_settings: dev_tool(names::DEV_SETTINGS)?,
        })
    }
}
