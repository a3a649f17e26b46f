use std::collections::HashMap;
use std::sync::Arc;

use crate::context::JsContext;
use crate::error::WorkerResult;

/// Application code evaluated once the worker knows the host modules.
pub trait Bundle: Send + Sync {
    fn evaluate(&self, ctx: &mut JsContext) -> WorkerResult<()>;
}

impl<F> Bundle for F
where
    F: Fn(&mut JsContext) -> WorkerResult<()> + Send + Sync,
{
    fn evaluate(&self, ctx: &mut JsContext) -> WorkerResult<()> {
        self(ctx)
    }
}

/// Bundles addressable by location.
#[derive(Clone, Default)]
pub struct BundleRegistry {
    bundles: HashMap<String, Arc<dyn Bundle>>,
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: impl Into<String>, bundle: impl Bundle + 'static) -> Self {
        self.register(location, bundle);
        self
    }

    pub fn register(&mut self, location: impl Into<String>, bundle: impl Bundle + 'static) {
        self.bundles.insert(location.into(), Arc::new(bundle));
    }

    pub fn get(&self, location: &str) -> Option<Arc<dyn Bundle>> {
        self.bundles.get(location).cloned()
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }
}
