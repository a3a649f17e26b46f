//! Static platform constants exported to the worker.

use module_abi::{BridgeHandle, BridgeModule, Constants, MethodTable};
use serde::Serialize;
use serde_json::json;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ReactNativeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Version of the JS framework the constants claim compatibility with.
pub const REACT_NATIVE_VERSION: ReactNativeVersion = ReactNativeVersion {
    major: 0,
    minor: 50,
    patch: 3,
};

pub struct PlatformConstants {
    _bridge: BridgeHandle,
}

impl BridgeModule for PlatformConstants {
    const CLASS_NAME: &'static str = "RCTPlatformConstants";

    fn new(bridge: BridgeHandle) -> Self {
        Self { _bridge: bridge }
    }

    fn methods() -> MethodTable<Self> {
        MethodTable::new()
    }

    fn constants_to_export(&self) -> Option<Constants> {
        let mut constants = Constants::new();
        constants.insert("forceTouchAvailable".into(), json!(false));
        constants.insert("reactNativeVersion".into(), json!(REACT_NATIVE_VERSION));
        Some(constants)
    }
}
