//! Shared host modules and helpers for the scenarios.

use std::time::Duration;

use module_abi::{
    Args, BridgeHandle, BridgeModule, MethodTable, ModuleClass, ModuleResult, Value,
};
use rndom_host::{Instance, InstanceOptions};
use serde_json::json;
use worker_runtime::BundleRegistry;

pub const LOAD_TIMEOUT: Duration = Duration::from_secs(5);
pub const PACING: Duration = Duration::from_millis(50);
pub const BUNDLE: &str = "scenario.bundle";
pub const APP: &str = "Scenario";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Records every value the worker hands it.
pub struct RCTProbe {
    pub records: Vec<Value>,
}

impl BridgeModule for RCTProbe {
    const CLASS_NAME: &'static str = "RCTProbe";

    fn new(_bridge: BridgeHandle) -> Self {
        Self {
            records: Vec::new(),
        }
    }

    fn methods() -> MethodTable<Self> {
        MethodTable::<Self>::new().method("record", |probe, args| {
            probe.records.push(args.get(0)?);
            Ok(())
        })
    }
}

/// In-memory key/value store with a promise-style getter.
pub struct RCTKeyValueStore {
    bridge: BridgeHandle,
    items: Vec<(String, Value)>,
}

impl RCTKeyValueStore {
    pub fn item(&self, key: &str) -> Option<&Value> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn set_item(&mut self, args: Args) -> ModuleResult<()> {
        let key: String = args.get(0)?;
        let value: Value = args.get(1)?;
        self.items.retain(|(k, _)| *k != key);
        self.items.push((key, value));
        Ok(())
    }

    fn get_item(&mut self, args: Args) -> ModuleResult<()> {
        let key: String = args.get(0)?;
        let resolve: u64 = args.get(1)?;
        let reject: u64 = args.get(2)?;
        match self.item(&key).cloned() {
            Some(value) => self.bridge.callback_from_id(resolve).invoke(vec![value]),
            None => self
                .bridge
                .callback_from_id(reject)
                .invoke(vec![json!({"message": format!("no item {key}")})]),
        }
        Ok(())
    }
}

impl BridgeModule for RCTKeyValueStore {
    const CLASS_NAME: &'static str = "RCTKeyValueStore";

    fn new(bridge: BridgeHandle) -> Self {
        Self {
            bridge,
            items: Vec::new(),
        }
    }

    fn methods() -> MethodTable<Self> {
        MethodTable::new()
            .method("setItem", Self::set_item)
            .exported("$getItem", Self::get_item)
    }
}

pub fn user_modules() -> Vec<ModuleClass> {
    vec![
        ModuleClass::of::<RCTProbe>(),
        ModuleClass::of::<RCTKeyValueStore>(),
    ]
}

/// Starts an instance of `bundles` and waits for the bundle to load.
pub fn started(bundles: BundleRegistry, options: InstanceOptions) -> Instance {
    init_logger();
    let options = InstanceOptions {
        native_modules: user_modules(),
        ..options
    };
    let mut instance = Instance::new(BUNDLE, APP, options, bundles).expect("instance");
    instance.start().expect("start");
    instance.wait_for_load(LOAD_TIMEOUT).expect("load");
    instance
}

pub fn records(instance: &Instance) -> Vec<Value> {
    instance
        .module::<RCTProbe>()
        .expect("probe registered")
        .records
        .clone()
}
