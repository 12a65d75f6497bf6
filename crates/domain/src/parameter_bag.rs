//! ParameterBag - filtered, read-only view over submitted input.
//!
//! A bag is built once per request and never mutated afterwards; every
//! filtering operation returns a new bag. Keys iterate in sorted order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;

/// Snapshot of submitted field/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterBag {
    params: Map<String, Value>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, only meant for constructing the snapshot.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Intersection of the existing keys with `keys`. Unknown keys are ignored.
    pub fn only<I, S>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let params = keys
            .into_iter()
            .filter_map(|key| {
                let key = key.as_ref();
                self.params
                    .get(key)
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect();
        Self { params }
    }

    /// Everything except `keys`.
    pub fn except<I, S>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut params = self.params.clone();
        for key in keys {
            params.remove(key.as_ref());
        }
        Self { params }
    }

    pub fn exists(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn all(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl From<Map<String, Value>> for ParameterBag {
    fn from(params: Map<String, Value>) -> Self {
        Self { params }
    }
}

impl TryFrom<Value> for ParameterBag {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(params) => Ok(Self { params }),
            _ => Err(DomainError::type_mismatch("parameters", "object")),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ParameterBag {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self {
            params: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
