use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ModuleError, ModuleResult};

/// Positional arguments of one native call, decoded lazily per index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Decodes a required argument.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> ModuleResult<T> {
        let value = self
            .values
            .get(index)
            .ok_or(ModuleError::MissingArgument { index })?;
        T::deserialize(value).map_err(|err| ModuleError::InvalidArgument {
            index,
            reason: err.to_string(),
        })
    }

    /// Decodes an argument that may be absent or `null`.
    pub fn optional<T: DeserializeOwned>(&self, index: usize) -> ModuleResult<Option<T>> {
        match self.values.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get(index).map(Some),
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}
