use std::any::Any;

use bridge_channel::{MethodId, ModuleConfig};
use serde_json::Value;

use crate::args::Args;
use crate::error::{ModuleError, ModuleResult};
use crate::handle::BridgeHandle;
use crate::method::MethodTable;
use crate::Constants;

/// Derives the bridge-visible module name by stripping a `RK` or `RCT` prefix.
pub fn bridge_module_name_for_class(class_name: &str) -> &str {
    class_name
        .strip_prefix("RK")
        .or_else(|| class_name.strip_prefix("RCT"))
        .unwrap_or(class_name)
}

/// Host lifecycle events delivered to modules.
#[derive(Clone, Debug, PartialEq)]
pub enum BridgeSignal {
    /// Native calls are queued; the UI manager should schedule a frame.
    RequestTick,
    /// Bundle download/evaluation progress reported by the worker.
    UpdateProgress(Value),
    /// The worker finished evaluating the bundle.
    JavaScriptDidLoad,
    /// A rendering frame began at `now_ms`.
    Frame { now_ms: f64 },
    /// Frame work is done; the rest of the frame budget is idle time.
    Idle { frame_start_ms: f64, now_ms: f64 },
}

/// Contract implemented by every module type.
pub trait BridgeModule: Send + Sized + 'static {
    /// Class name; the module name is derived from it.
    const CLASS_NAME: &'static str;

    fn new(bridge: BridgeHandle) -> Self;

    /// Remotely callable methods, in dispatch order.
    fn methods() -> MethodTable<Self>;

    /// Evaluated once, when the descriptor is built.
    fn constants_to_export(&self) -> Option<Constants> {
        None
    }

    fn handle_signal(&mut self, _signal: &BridgeSignal) {}

    /// Keeps the host frame clock running while `true`.
    fn wants_frame(&self) -> bool {
        false
    }
}

/// Type-erased module as held by the bridge registry.
pub trait NativeModule: Send {
    fn name(&self) -> &str;

    fn describe(&self) -> ModuleConfig;

    fn method_count(&self) -> usize;

    fn method_name(&self, method_id: MethodId) -> Option<&'static str>;

    fn invoke(&mut self, method_id: MethodId, args: Vec<Value>) -> ModuleResult<()>;

    fn handle_signal(&mut self, signal: &BridgeSignal);

    fn wants_frame(&self) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A module value together with the method table it dispatches through.
pub struct ModuleInstance<T> {
    name: String,
    module: T,
    table: MethodTable<T>,
}

impl<T: BridgeModule> ModuleInstance<T> {
    /// Constructs the module and validates its declared methods.
    pub fn new(bridge: BridgeHandle) -> ModuleResult<Self> {
        let name = bridge_module_name_for_class(T::CLASS_NAME).to_string();
        let table = T::methods();
        table.validate(&name)?;
        Ok(Self {
            name,
            module: T::new(bridge),
            table,
        })
    }

    pub fn module(&self) -> &T {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut T {
        &mut self.module
    }
}

impl<T: BridgeModule> NativeModule for ModuleInstance<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> ModuleConfig {
        self.table
            .describe(&self.name, self.module.constants_to_export())
    }

    fn method_count(&self) -> usize {
        self.table.len()
    }

    fn method_name(&self, method_id: MethodId) -> Option<&'static str> {
        self.table.get(method_id).map(|m| m.name())
    }

    fn invoke(&mut self, method_id: MethodId, args: Vec<Value>) -> ModuleResult<()> {
        let handler = self
            .table
            .get(method_id)
            .ok_or_else(|| ModuleError::UnknownMethod {
                module: self.name.clone(),
                method_id,
            })?
            .handler();
        handler(&mut self.module, Args::new(args))
    }

    fn handle_signal(&mut self, signal: &BridgeSignal) {
        self.module.handle_signal(signal);
    }

    fn wants_frame(&self) -> bool {
        self.module.wants_frame()
    }

    fn as_any(&self) -> &dyn Any {
        &self.module
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.module
    }
}

type Factory = fn(BridgeHandle) -> ModuleResult<Box<dyn NativeModule>>;

/// Registration token for a module type; the bridge instantiates it.
#[derive(Clone, Copy)]
pub struct ModuleClass {
    class_name: &'static str,
    factory: Factory,
}

impl std::fmt::Debug for ModuleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ModuleClass").field(&self.class_name).finish()
    }
}

fn instantiate<T: BridgeModule>(bridge: BridgeHandle) -> ModuleResult<Box<dyn NativeModule>> {
    Ok(Box::new(ModuleInstance::<T>::new(bridge)?))
}

impl ModuleClass {
    pub fn of<T: BridgeModule>() -> Self {
        Self {
            class_name: T::CLASS_NAME,
            factory: instantiate::<T>,
        }
    }

    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    pub fn module_name(&self) -> &'static str {
        bridge_module_name_for_class(self.class_name)
    }

    pub fn instantiate(&self, bridge: BridgeHandle) -> ModuleResult<Box<dyn NativeModule>> {
        (self.factory)(bridge)
    }
}
