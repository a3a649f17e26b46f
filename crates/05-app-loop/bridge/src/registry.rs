use std::collections::HashMap;

use bridge_channel::{ModuleConfig, ModuleId};
use log::debug;
use module_abi::{BridgeHandle, BridgeModule, ModuleClass, NativeModule};

use crate::error::{BridgeError, BridgeResult};

/// Registered modules, their descriptors and a by-name index.
///
/// Built once; module ids are positions in registration order and index the
/// descriptor array sent to the worker.
pub struct ModuleRegistry {
    modules: Vec<Box<dyn NativeModule>>,
    descriptors: Vec<ModuleConfig>,
    by_name: HashMap<String, ModuleId>,
}

impl ModuleRegistry {
    /// Instantiates `classes` in order. Names are checked before any module
    /// is constructed.
    pub fn build(classes: &[ModuleClass], bridge: &BridgeHandle) -> BridgeResult<Self> {
        let mut by_name = HashMap::with_capacity(classes.len());
        for (module_id, class) in classes.iter().enumerate() {
            let name = class.module_name();
            if by_name.insert(name.to_string(), module_id).is_some() {
                return Err(BridgeError::DuplicateModule {
                    name: name.to_string(),
                });
            }
        }

        let mut modules = Vec::with_capacity(classes.len());
        for class in classes {
            modules.push(class.instantiate(bridge.clone())?);
        }
        let descriptors: Vec<ModuleConfig> = modules.iter().map(|module| module.describe()).collect();
        debug!(
            "registered {} modules: {:?}",
            descriptors.len(),
            descriptors.iter().map(|d| d.name.as_str()).collect::<Vec<_>>()
        );

        Ok(Self {
            modules,
            descriptors,
            by_name,
        })
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn descriptors(&self) -> &[ModuleConfig] {
        &self.descriptors
    }

    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, module_id: ModuleId) -> Option<&dyn NativeModule> {
        self.modules.get(module_id).map(|module| module.as_ref())
    }

    /// Panics if `module_id` was not issued by this registry.
    pub(crate) fn module(&self, module_id: ModuleId) -> &dyn NativeModule {
        self.modules[module_id].as_ref()
    }

    pub fn get_mut(&mut self, module_id: ModuleId) -> Option<&mut (dyn NativeModule + 'static)> {
        self.modules.get_mut(module_id).map(|module| module.as_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn NativeModule> {
        self.modules.iter().map(|module| module.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn NativeModule + 'static)> {
        self.modules.iter_mut().map(|module| module.as_mut())
    }

    /// Typed access to the registered instance of `T`.
    pub fn module_for_class<T: BridgeModule>(&self) -> Option<&T> {
        let module_id = self.module_id(ModuleClass::of::<T>().module_name())?;
        self.get(module_id)?.as_any().downcast_ref::<T>()
    }

    pub fn module_for_class_mut<T: BridgeModule>(&mut self) -> Option<&mut T> {
        let module_id = self.module_id(ModuleClass::of::<T>().module_name())?;
        self.get_mut(module_id)?.as_any_mut().downcast_mut::<T>()
    }
}
