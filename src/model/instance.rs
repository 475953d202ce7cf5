//! Validated model instances.
//!
//! An instance is a typed field table in declaration order plus a bitset
//! recording which fields the caller explicitly supplied. Instances are
//! immutable unless the model declares `validate_assignment`, in which
//! case a write re-validates only the written field.

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::decl::{ModelSpec, SpecRegistry};
use crate::validate::{Engine, ErrorKind, ValidationError, ValidationFailure};

/// Small bitset over field positions.
#[derive(Debug, Clone)]
pub(crate) struct FieldSet {
    words: Vec<u64>,
    len: usize,
}

impl FieldSet {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    pub(crate) fn set(&mut self, index: usize) {
        debug_assert!(index < self.len);
        self.words[index / 64] |= 1 << (index % 64);
    }

    pub(crate) fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len);
        self.words[index / 64] & (1 << (index % 64)) != 0
    }
}

/// A validated instance of one model.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    spec: Arc<ModelSpec>,
    registry: Arc<SpecRegistry>,
    config: EngineConfig,
    /// Coerced values in declaration order
    values: Vec<Value>,
    /// Fields the caller explicitly supplied (null included)
    supplied: FieldSet,
}

impl ModelInstance {
    /// Assembles an instance from the engine's coerced mapping and the
    /// original input keys. Keys the root hook introduced beyond the
    /// declared fields are dropped here; declared fields it removed
    /// become null.
    pub(crate) fn from_validated(
        spec: Arc<ModelSpec>,
        registry: Arc<SpecRegistry>,
        config: EngineConfig,
        mut validated: Map<String, Value>,
        input: &Map<String, Value>,
    ) -> Self {
        let mut supplied = FieldSet::new(spec.field_count());
        let mut values = Vec::with_capacity(spec.field_count());
        for (i, field) in spec.fields.iter().enumerate() {
            values.push(validated.remove(&field.name).unwrap_or(Value::Null));
            if input.contains_key(&field.name) {
                supplied.set(i);
            }
        }
        Self {
            spec,
            registry,
            config,
            values,
            supplied,
        }
    }

    /// The model name.
    pub fn model_name(&self) -> &str {
        &self.spec.name
    }

    /// The spec this instance was validated against.
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Reads a field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.spec.field_index(field).map(|i| &self.values[i])
    }

    /// True if the caller explicitly supplied the field.
    pub fn is_supplied(&self, field: &str) -> bool {
        self.spec
            .field_index(field)
            .map(|i| self.supplied.get(i))
            .unwrap_or(false)
    }

    /// Writes a field, re-validating only that field.
    ///
    /// Fails unless the model declares `validate_assignment`. A successful
    /// write marks the field as supplied.
    pub fn set(&mut self, field: &str, value: Value) -> Result<(), ValidationFailure> {
        if !self.spec.config.validate_assignment {
            return Err(ValidationFailure::single(
                &self.spec.name,
                ValidationError {
                    path: field.to_string(),
                    message: format!(
                        "model '{}' is immutable (validate_assignment is off)",
                        self.spec.name
                    ),
                    kind: ErrorKind::ConstraintViolation,
                    value: Some(value),
                },
            ));
        }

        let engine = Engine::new(&self.registry, self.config);
        let current = self.to_map();
        let coerced = engine.validate_field(&self.spec, field, &value, &current)?;

        // validate_field rejects unknown fields, so the index exists.
        if let Some(index) = self.spec.field_index(field) {
            self.values[index] = coerced;
            self.supplied.set(index);
        }
        Ok(())
    }

    /// Exports the instance as a mapping in declaration order.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for (field, value) in self.spec.fields.iter().zip(&self.values) {
            out.insert(field.name.clone(), value.clone());
        }
        out
    }

    /// Exports the instance, omitting fields the caller never explicitly
    /// supplied.
    pub fn to_map_exclude_unset(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for (i, (field, value)) in self.spec.fields.iter().zip(&self.values).enumerate() {
            if self.supplied.get(i) {
                out.insert(field.name.clone(), value.clone());
            }
        }
        out
    }

    /// Serializes the instance to JSON text.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&Value::Object(self.to_map()))
    }

    /// Serializes the instance to pretty-printed JSON text.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Value::Object(self.to_map()))
    }
}
