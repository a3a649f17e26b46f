//! Wire shapes shared by the host bridge and the worker.
//!
//! Both sides derive positions from the same arrays: a [`ModuleId`] indexes
//! the descriptor list sent in `loadBridgeConfig`, and a [`MethodId`] indexes
//! that descriptor's method list. The host never reinterprets these after the
//! handshake, so any change here must be mirrored on both ends.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ProtocolError;

/// Index into the descriptor array sent during the handshake.
pub type ModuleId = usize;
/// Index into a module's method table.
pub type MethodId = usize;

/// Wire description of one host module.
///
/// Serialised as the positional tuple
/// `[name, constants|null, [methodName...], [promiseIds...], [syncIds...]]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModuleConfig {
    pub name: String,
    pub constants: Option<Map<String, Value>>,
    pub methods: Vec<String>,
    pub promise_methods: Vec<MethodId>,
    /// Reserved; always empty.
    pub sync_methods: Vec<MethodId>,
}

impl ModuleConfig {
    /// Position of `method` in this module's method list.
    pub fn method_id(&self, method: &str) -> Option<MethodId> {
        self.methods.iter().position(|name| name == method)
    }

    pub fn is_promise(&self, method_id: MethodId) -> bool {
        self.promise_methods.contains(&method_id)
    }
}

type ModuleConfigTuple = (
    String,
    Option<Map<String, Value>>,
    Vec<String>,
    Vec<MethodId>,
    Vec<MethodId>,
);

impl Serialize for ModuleConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (
            &self.name,
            &self.constants,
            &self.methods,
            &self.promise_methods,
            &self.sync_methods,
        )
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ModuleConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (name, constants, methods, promise_methods, sync_methods) =
            ModuleConfigTuple::deserialize(deserializer)?;
        Ok(Self {
            name,
            constants,
            methods,
            promise_methods,
            sync_methods,
        })
    }
}

/// One decoded request to invoke a host module method.
#[derive(Clone, Debug, PartialEq)]
pub struct NativeCall {
    pub module_id: ModuleId,
    pub method_id: MethodId,
    pub args: Vec<Value>,
}

/// Column-oriented batch of native calls as carried by `flushedQueue`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallBatch {
    module_ids: Vec<ModuleId>,
    method_ids: Vec<MethodId>,
    params: Vec<Vec<Value>>,
}

impl CallBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.module_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.module_ids.is_empty()
    }

    /// Appends one call, keeping the three columns aligned.
    pub fn push(&mut self, module_id: ModuleId, method_id: MethodId, args: Vec<Value>) {
        self.module_ids.push(module_id);
        self.method_ids.push(method_id);
        self.params.push(args);
    }

    /// Decodes a `flushedQueue` payload.
    ///
    /// A `null` payload is an empty batch. Otherwise the payload must be an
    /// array whose first three elements are equal-length arrays of module ids,
    /// method ids and argument lists; any further elements are ignored.
    pub fn from_payload(payload: &Value) -> Result<Self, ProtocolError> {
        let parts = match payload {
            Value::Null => return Ok(Self::default()),
            Value::Array(parts) => parts,
            other => {
                return Err(ProtocolError::MalformedBatch(format!(
                    "expected array, found {}",
                    kind_of(other)
                )))
            }
        };
        if parts.len() < 3 {
            return Err(ProtocolError::MalformedBatch(format!(
                "expected 3 columns, found {}",
                parts.len()
            )));
        }

        let module_ids: Vec<ModuleId> = column(&parts[0], "module ids")?;
        let method_ids: Vec<MethodId> = column(&parts[1], "method ids")?;
        let params: Vec<Vec<Value>> = column(&parts[2], "params")?;

        if module_ids.len() != method_ids.len() || module_ids.len() != params.len() {
            return Err(ProtocolError::MalformedBatch(format!(
                "column lengths differ: {} module ids, {} method ids, {} params",
                module_ids.len(),
                method_ids.len(),
                params.len()
            )));
        }

        Ok(Self {
            module_ids,
            method_ids,
            params,
        })
    }

    pub fn to_payload(&self) -> Value {
        json!([self.module_ids, self.method_ids, self.params])
    }

    /// Unpacks the batch index-wise, preserving order.
    pub fn into_calls(self) -> impl Iterator<Item = NativeCall> {
        self.module_ids
            .into_iter()
            .zip(self.method_ids)
            .zip(self.params)
            .map(|((module_id, method_id), args)| NativeCall {
                module_id,
                method_id,
                args,
            })
    }
}

fn column<T: serde::de::DeserializeOwned>(
    value: &Value,
    what: &str,
) -> Result<T, ProtocolError> {
    T::deserialize(value).map_err(|err| ProtocolError::MalformedBatch(format!("{what}: {err}")))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
