//! Model handles: the caller-facing validation surface.
//!
//! A `ModelType` binds one compiled spec to a registry and an engine
//! configuration. It validates mappings and raw JSON text into
//! [`ModelInstance`]s, and derives the structural schema export without
//! re-validating anything.

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::decl::{CompileError, CompileResult, ModelSpec, SpecRegistry};
use crate::model::instance::ModelInstance;
use crate::model::schema_export::ModelSchema;
use crate::validate::{Engine, ValidationError, ValidationFailure};

/// A bound, reusable handle to one registered model.
#[derive(Debug, Clone)]
pub struct ModelType {
    spec: Arc<ModelSpec>,
    registry: Arc<SpecRegistry>,
    config: EngineConfig,
}

impl ModelType {
    /// Binds a registered model by name.
    pub fn bind(
        registry: Arc<SpecRegistry>,
        name: &str,
        config: EngineConfig,
    ) -> CompileResult<Self> {
        let spec = registry
            .get(name)
            .ok_or_else(|| CompileError::unknown_model(name, name))?;
        Ok(Self {
            spec,
            registry,
            config,
        })
    }

    /// The model name.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// The underlying spec.
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Validates a mapping into an instance. The failure carries every
    /// failing field, never only the first.
    pub fn validate(&self, data: &Map<String, Value>) -> Result<ModelInstance, ValidationFailure> {
        let engine = Engine::new(&self.registry, self.config);
        let validated = engine.validate_spec(&self.spec, data)?;
        Ok(ModelInstance::from_validated(
            Arc::clone(&self.spec),
            Arc::clone(&self.registry),
            self.config,
            validated,
            data,
        ))
    }

    /// Validates an already-parsed JSON value. Anything but an object is
    /// a type error at the root.
    pub fn parse_obj(&self, value: &Value) -> Result<ModelInstance, ValidationFailure> {
        match value.as_object() {
            Some(map) => self.validate(map),
            None => Err(ValidationFailure::single(
                &self.spec.name,
                ValidationError::type_mismatch("$root", "object", value),
            )),
        }
    }

    /// Parses and validates raw JSON text. Malformed JSON is a parse
    /// error at the root, reported before any field validation.
    pub fn parse_raw(&self, text: &str) -> Result<ModelInstance, ValidationFailure> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            ValidationFailure::single(&self.spec.name, ValidationError::parse("$root", e.to_string()))
        })?;
        self.parse_obj(&value)
    }

    /// Derives the structural schema description from the spec. No
    /// validation machinery runs.
    pub fn schema(&self) -> ModelSchema {
        ModelSchema::from_spec(&self.spec)
    }
}
