//! Declared method tables.
//!
//! A module lists its remotely callable methods explicitly, in order. The
//! position of a method in its table is the `MethodId` the worker uses, and
//! the descriptor sent during the handshake is produced from the same table.

use std::collections::HashSet;

use bridge_channel::{MethodId, ModuleConfig};

use crate::args::Args;
use crate::error::{ModuleError, ModuleResult};
use crate::Constants;

/// Names that can never be exported.
const RESERVED: [&str; 2] = ["constructor", "constantsToExport"];

/// Host-side method body.
pub type Handler<T> = fn(&mut T, Args) -> ModuleResult<()>;

/// How the worker should stub a method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodKind {
    /// Fire-and-forget; results, if any, come back through callback ids.
    Async,
    /// The worker wraps the call in a promise and appends resolve/reject
    /// callback ids as the last two arguments.
    Promise,
}

pub struct Method<T> {
    name: &'static str,
    kind: MethodKind,
    handler: Handler<T>,
}

impl<T> Clone for Method<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Method<T> {}

impl<T> std::fmt::Debug for Method<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl<T> Method<T> {
    pub fn new(name: &'static str, kind: MethodKind, handler: Handler<T>) -> Self {
        Self {
            name,
            kind,
            handler,
        }
    }

    /// Builds a method from its exported JavaScript-style name, where a `$`
    /// prefix marks a promise method and is not part of the registered name.
    pub fn exported(exported: &'static str, handler: Handler<T>) -> Self {
        match exported.strip_prefix('$') {
            Some(name) => Self::new(name, MethodKind::Promise, handler),
            None => Self::new(exported, MethodKind::Async, handler),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    pub fn is_promise(&self) -> bool {
        self.kind == MethodKind::Promise
    }

    pub fn handler(&self) -> Handler<T> {
        self.handler
    }
}

/// Ordered method list for one module type.
pub struct MethodTable<T> {
    methods: Vec<Method<T>>,
}

impl<T> Default for MethodTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for MethodTable<T> {
    fn clone(&self) -> Self {
        Self {
            methods: self.methods.clone(),
        }
    }
}

impl<T> std::fmt::Debug for MethodTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.methods.iter()).finish()
    }
}

impl<T> MethodTable<T> {
    pub fn new() -> Self {
        Self {
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, name: &'static str, handler: Handler<T>) -> Self {
        self.push(Method::new(name, MethodKind::Async, handler));
        self
    }

    pub fn promise(mut self, name: &'static str, handler: Handler<T>) -> Self {
        self.push(Method::new(name, MethodKind::Promise, handler));
        self
    }

    /// Adds a method by exported name; see [`Method::exported`].
    pub fn exported(mut self, exported: &'static str, handler: Handler<T>) -> Self {
        self.push(Method::exported(exported, handler));
        self
    }

    /// Appends another table's methods after this one's.
    pub fn extend(mut self, other: MethodTable<T>) -> Self {
        self.methods.extend(other.methods);
        self
    }

    pub fn push(&mut self, method: Method<T>) {
        self.methods.push(method);
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn get(&self, method_id: MethodId) -> Option<&Method<T>> {
        self.methods.get(method_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Method<T>> {
        self.methods.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.methods.iter().map(Method::name).collect()
    }

    /// Checks that every method can be exported under its name.
    pub fn validate(&self, module: &str) -> ModuleResult<()> {
        let invalid = |reason: String| ModuleError::InvalidMethodTable {
            module: module.to_string(),
            reason,
        };
        let mut seen = HashSet::with_capacity(self.methods.len());
        for method in &self.methods {
            let name = method.name;
            if name.is_empty() {
                return Err(invalid("empty method name".into()));
            }
            if name.starts_with('_') {
                return Err(invalid(format!("`{name}` is private")));
            }
            if name.starts_with('$') {
                return Err(invalid(format!(
                    "`{name}` carries a `$` prefix; declare it as a promise method instead"
                )));
            }
            if RESERVED.contains(&name) {
                return Err(invalid(format!("`{name}` is reserved")));
            }
            if !seen.insert(name) {
                return Err(invalid(format!("`{name}` is declared twice")));
            }
        }
        Ok(())
    }

    /// Derives the wire descriptor for this table.
    pub fn describe(&self, name: &str, constants: Option<Constants>) -> ModuleConfig {
        ModuleConfig {
            name: name.to_string(),
            constants,
            methods: self.methods.iter().map(|m| m.name.to_string()).collect(),
            promise_methods: self
                .methods
                .iter()
                .enumerate()
                .filter(|(_, m)| m.is_promise())
                .map(|(id, _)| id)
                .collect(),
            sync_methods: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    fn noop(_: &mut Probe, _: Args) -> ModuleResult<()> {
        Ok(())
    }

    #[test]
    fn dollar_prefix_marks_promise_and_is_stripped() {
        let table = MethodTable::<Probe>::new()
            .exported("multiGet", noop)
            .exported("$getItem", noop)
            .method("clear", noop);
        assert_eq!(table.names(), vec!["multiGet", "getItem", "clear"]);
        let config = table.describe("AsyncLocalStorage", None);
        assert_eq!(config.methods, vec!["multiGet", "getItem", "clear"]);
        assert_eq!(config.promise_methods, vec![1]);
        assert!(config.sync_methods.is_empty());
    }

    #[test]
    fn validation_rejects_unexportable_names() {
        let cases = [
            MethodTable::<Probe>::new().method("_frame", noop),
            MethodTable::<Probe>::new().method("constantsToExport", noop),
            MethodTable::<Probe>::new().method("constructor", noop),
            MethodTable::<Probe>::new().method("", noop),
            MethodTable::<Probe>::new().method("$raw", noop),
            MethodTable::<Probe>::new()
                .method("show", noop)
                .promise("show", noop),
        ];
        for table in cases {
            assert!(
                matches!(
                    table.validate("Probe"),
                    Err(ModuleError::InvalidMethodTable { .. })
                ),
                "{table:?} should be rejected"
            );
        }
    }

    #[test]
    fn extend_keeps_positions_stable() {
        let base = MethodTable::<Probe>::new().method("addListener", noop);
        let table = MethodTable::<Probe>::new()
            .method("show", noop)
            .extend(base);
        assert_eq!(table.get(1).map(Method::name), Some("addListener"));
        assert!(table.validate("Probe").is_ok());
    }
}
