//! Keyed attribute tree used to persist per-block state.
//!
//! Mirrors the host's generic save format: a flat, ordered map of typed values.
//! Missing keys read as the type's default so older saves keep loading.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::pos::Vec3i;

/// Errors produced while encoding or decoding a tree.
#[derive(Debug, Error)]
pub enum AttributeError {
    /// Binary codec failure.
    #[error("failed to encode/decode attribute tree: {0}")]
    Codec(#[from] bincode::Error),
}

/// Single typed value stored in a [`TreeAttribute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i32),
    /// Float.
    Float(f32),
    /// UTF-8 string.
    String(String),
    /// Integer vector.
    Vec3i(Vec3i),
}

/// Ordered attribute tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeAttribute {
    values: BTreeMap<String, AttributeValue>,
}

impl TreeAttribute {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bool at `key`, `false` when missing or of another type.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get_bool_or(key, false)
    }

    /// Bool at `key` or the supplied default.
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(AttributeValue::Bool(v)) => *v,
            _ => default,
        }
    }

    /// Float at `key`, `0.0` when missing. Integers are widened.
    pub fn get_float(&self, key: &str) -> f32 {
        match self.values.get(key) {
            Some(AttributeValue::Float(v)) => *v,
            Some(AttributeValue::Int(v)) => *v as f32,
            _ => 0.0,
        }
    }

    /// Integer at `key`, `0` when missing.
    pub fn get_int(&self, key: &str) -> i32 {
        match self.values.get(key) {
            Some(AttributeValue::Int(v)) => *v,
            _ => 0,
        }
    }

    /// String at `key`.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(AttributeValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Vector at `key`.
    pub fn get_vec3i(&self, key: &str) -> Option<Vec3i> {
        match self.values.get(key) {
            Some(AttributeValue::Vec3i(v)) => Some(*v),
            _ => None,
        }
    }

    /// Store a bool.
    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), AttributeValue::Bool(value));
    }

    /// Store a float.
    pub fn set_float(&mut self, key: &str, value: f32) {
        self.values.insert(key.to_string(), AttributeValue::Float(value));
    }

    /// Store an integer.
    pub fn set_int(&mut self, key: &str, value: i32) {
        self.values.insert(key.to_string(), AttributeValue::Int(value));
    }

    /// Store a string.
    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.values
            .insert(key.to_string(), AttributeValue::String(value.into()));
    }

    /// Store a vector.
    pub fn set_vec3i(&mut self, key: &str, value: Vec3i) {
        self.values.insert(key.to_string(), AttributeValue::Vec3i(value));
    }

    /// Remove a key, returning the previous value.
    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.values.remove(key)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encode to the compact binary save form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, AttributeError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from [`Self::to_bytes`] output.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AttributeError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
