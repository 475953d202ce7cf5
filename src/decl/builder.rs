//! Declarative model builder.
//!
//! A model is described as an ordered set of fields, each a (name, type,
//! constraints, default) tuple. The builder produces a plain [`ModelDecl`]
//! value; all checking happens later, when the declaration is registered
//! and compiled.
//!
//! ```ignore
//! let user = ModelBuilder::new("user")
//!     .field(Field::required("name", TypeExpr::Str).min_len(2))
//!     .field(Field::required("age", TypeExpr::Int).ge(0.0).le(120.0))
//!     .build();
//! ```

use serde_json::Value;
use std::collections::HashMap;

use super::hooks::{FieldHook, RootHook};
use super::types::{Constraints, FieldDecl, ModelConfig, ModelDecl, TypeExpr};

/// Builder for a single field declaration.
#[derive(Debug, Clone)]
pub struct Field {
    decl: FieldDecl,
}

impl Field {
    /// Starts a required field of the given type.
    pub fn required(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            decl: FieldDecl {
                name: name.into(),
                ty,
                constraints: Constraints::default(),
                required: true,
                default: None,
            },
        }
    }

    /// Starts an optional field with a default substituted when missing.
    pub fn with_default(name: impl Into<String>, ty: TypeExpr, default: Value) -> Self {
        Self {
            decl: FieldDecl {
                name: name.into(),
                ty,
                constraints: Constraints::default(),
                required: false,
                default: Some(default),
            },
        }
    }

    /// Starts a nullable field: missing input becomes null.
    pub fn nullable(name: impl Into<String>, inner: TypeExpr) -> Self {
        Self {
            decl: FieldDecl {
                name: name.into(),
                ty: TypeExpr::optional(inner),
                constraints: Constraints::default(),
                required: false,
                default: None,
            },
        }
    }

    /// Inclusive numeric lower bound.
    pub fn ge(mut self, bound: f64) -> Self {
        self.decl.constraints.ge = Some(bound);
        self
    }

    /// Inclusive numeric upper bound.
    pub fn le(mut self, bound: f64) -> Self {
        self.decl.constraints.le = Some(bound);
        self
    }

    /// Value must be a multiple of the given number.
    pub fn multiple_of(mut self, base: f64) -> Self {
        self.decl.constraints.multiple_of = Some(base);
        self
    }

    /// Minimum string length in characters.
    pub fn min_len(mut self, len: usize) -> Self {
        self.decl.constraints.min_len = Some(len);
        self
    }

    /// Maximum string length in characters.
    pub fn max_len(mut self, len: usize) -> Self {
        self.decl.constraints.max_len = Some(len);
        self
    }

    /// Regular expression the whole string must match.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.decl.constraints.pattern = Some(pattern.into());
        self
    }

    /// Trim surrounding whitespace before checks.
    pub fn trim(mut self) -> Self {
        self.decl.constraints.trim = true;
        self
    }

    /// Lowercase before checks.
    pub fn lowercase(mut self) -> Self {
        self.decl.constraints.lowercase = true;
        self
    }

    /// Minimum number of list items.
    pub fn min_items(mut self, count: usize) -> Self {
        self.decl.constraints.min_items = Some(count);
        self
    }

    /// Maximum number of list items.
    pub fn max_items(mut self, count: usize) -> Self {
        self.decl.constraints.max_items = Some(count);
        self
    }

    /// Reject duplicate list items.
    pub fn unique_items(mut self) -> Self {
        self.decl.constraints.unique_items = true;
        self
    }

    /// Finishes the field declaration.
    pub fn build(self) -> FieldDecl {
        self.decl
    }
}

impl From<Field> for FieldDecl {
    fn from(field: Field) -> FieldDecl {
        field.decl
    }
}

/// Builder for a complete model declaration.
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    description: Option<String>,
    fields: Vec<FieldDecl>,
    config: ModelConfig,
    field_hooks: HashMap<String, FieldHook>,
    root_hook: Option<RootHook>,
}

impl ModelBuilder {
    /// Starts a model declaration with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
            config: ModelConfig::default(),
            field_hooks: HashMap::new(),
            root_hook: None,
        }
    }

    /// Sets the model description.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Appends a field. Declaration order is preserved.
    pub fn field(mut self, field: impl Into<FieldDecl>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Reports unknown input keys instead of ignoring them.
    pub fn strict_extra(mut self) -> Self {
        self.config.strict_extra = true;
        self
    }

    /// Allows post-construction writes with single-field re-validation.
    pub fn validate_assignment(mut self) -> Self {
        self.config.validate_assignment = true;
        self
    }

    /// Overrides the engine-wide coercion mode for this model.
    pub fn strict_types(mut self, strict: bool) -> Self {
        self.config.strict_types = Some(strict);
        self
    }

    /// Attaches a cross-field hook to the named field.
    pub fn field_hook(mut self, field: impl Into<String>, hook: FieldHook) -> Self {
        self.field_hooks.insert(field.into(), hook);
        self
    }

    /// Attaches a whole-model hook.
    pub fn root_hook(mut self, hook: RootHook) -> Self {
        self.root_hook = Some(hook);
        self
    }

    /// Finishes the declaration.
    pub fn build(self) -> ModelDecl {
        ModelDecl {
            name: self.name,
            description: self.description,
            fields: self.fields,
            config: self.config,
            field_hooks: self.field_hooks,
            root_hook: self.root_hook,
        }
    }
}
