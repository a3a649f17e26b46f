use serde::Deserialize;

/// Core bridge settings supplied by the host entry point.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Application component passed to `AppRegistry.runApplication`.
    pub module_name: String,
    /// Location the worker resolves the bundle from.
    pub bundle_location: String,
    /// Requires the dev loading view and dev settings modules.
    pub dev_mode: bool,
}

impl BridgeConfig {
    pub fn new(module_name: impl Into<String>, bundle_location: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            bundle_location: bundle_location.into(),
            dev_mode: false,
        }
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new("App", "index.bundle")
    }
}
