//! Device dimensions module.
//!
//! Exports the window/screen dimensions as constants and emits
//! `didUpdateDimensions` whenever the host reports new display metrics.

use module_abi::{BridgeHandle, BridgeModule, Constants, MethodTable};
use modules_common::{emitter_methods, Emission, EventEmitter, EventEmitterModule};
use serde::Serialize;
use serde_json::json;

pub const DID_UPDATE_DIMENSIONS: &str = "didUpdateDimensions";

/// Pixel ratios above this are clamped; 3x displays render hairlines badly.
const MAX_PIXEL_RATIO: f64 = 2.0;

/// Raw display metrics as observed by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayMetrics {
    pub inner_width: f64,
    pub inner_height: f64,
    pub device_pixel_ratio: Option<f64>,
    pub system_xdpi: Option<f64>,
    pub logical_xdpi: Option<f64>,
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self {
            inner_width: 1280.0,
            inner_height: 720.0,
            device_pixel_ratio: Some(1.0),
            system_xdpi: None,
            logical_xdpi: None,
        }
    }
}

impl DisplayMetrics {
    /// Effective pixel ratio; DPI-derived zoom wins over the device ratio.
    pub fn pixel_ratio(&self) -> f64 {
        let ratio = match (self.system_xdpi, self.logical_xdpi, self.device_pixel_ratio) {
            (Some(system), Some(logical), _) if system > logical => system / logical,
            (_, _, Some(device)) => device,
            _ => 1.0,
        };
        ratio.min(MAX_PIXEL_RATIO)
    }

    pub fn dimensions(&self) -> Dimensions {
        let dims = Dims {
            width: self.inner_width.ceil(),
            height: self.inner_height.ceil(),
            scale: self.pixel_ratio(),
            font_scale: 1.0,
        };
        Dimensions {
            window: dims,
            screen: dims,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dims {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub font_scale: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Dimensions {
    pub window: Dims,
    pub screen: Dims,
}

pub struct DeviceInfo {
    emitter: EventEmitter,
    metrics: DisplayMetrics,
}

impl DeviceInfo {
    pub fn metrics(&self) -> DisplayMetrics {
        self.metrics
    }

    /// Records new metrics and notifies listeners.
    pub fn update_dimensions(&mut self, metrics: DisplayMetrics) -> Emission {
        self.metrics = metrics;
        self.emitter
            .send_event_with_name(DID_UPDATE_DIMENSIONS, Some(json!(metrics.dimensions())))
    }

    pub fn listener_count(&self) -> usize {
        self.emitter.listener_count()
    }
}

impl BridgeModule for DeviceInfo {
    const CLASS_NAME: &'static str = "RCTDeviceInfo";

    fn new(bridge: BridgeHandle) -> Self {
        let mut emitter = EventEmitter::new(bridge);
        // Dimension changes are always forwarded, subscribed or not.
        emitter.set_listener_count(1);
        Self {
            emitter,
            metrics: DisplayMetrics::default(),
        }
    }

    fn methods() -> MethodTable<Self> {
        emitter_methods()
    }

    fn constants_to_export(&self) -> Option<Constants> {
        let mut constants = Constants::new();
        constants.insert("Dimensions".into(), json!(self.metrics.dimensions()));
        Some(constants)
    }
}

impl EventEmitterModule for DeviceInfo {
    fn emitter(&mut self) -> &mut EventEmitter {
        &mut self.emitter
    }

    fn supported_events(&self) -> &'static [&'static str] {
        &[DID_UPDATE_DIMENSIONS]
    }
}
