//! Model declaration types.
//!
//! Supported field types:
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - str: UTF-8 string
//! - bool: Boolean
//! - datetime: RFC 3339 timestamp, normalized on input
//! - uuid: canonical hyphenated UUID, normalized on input
//! - list: homogeneous list with a single item type
//! - optional: nullable wrapper around an inner type
//! - union: ordered alternatives, first match wins
//! - model: reference to another registered model
//! - custom: a registered parser function (interpreted path only)
//!
//! A declaration is pure data: it can be built with [`ModelBuilder`],
//! serialized to JSON, stored on disk, and reloaded. Hooks are the one
//! exception — they are process-local callbacks attached through the
//! builder and never serialized.
//!
//! [`ModelBuilder`]: super::builder::ModelBuilder

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::hooks::{FieldHook, RootHook};

/// Declared field type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TypeExpr {
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// UTF-8 string
    Str,
    /// Boolean
    Bool,
    /// RFC 3339 timestamp
    Datetime,
    /// Canonical UUID
    Uuid,
    /// Homogeneous list with a single item type
    List {
        /// Item type (boxed to allow recursive types)
        item: Box<TypeExpr>,
    },
    /// Nullable wrapper
    Optional {
        /// Inner type
        inner: Box<TypeExpr>,
    },
    /// Ordered alternatives, tried left to right
    Union {
        /// Alternative types in declaration order
        alternatives: Vec<TypeExpr>,
    },
    /// Reference to another registered model
    Model {
        /// Referenced model name
        model: String,
    },
    /// Registered custom parser, resolved at finalize
    Custom {
        /// Parser name
        parser: String,
    },
}

impl TypeExpr {
    /// Returns the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            TypeExpr::Int => "int",
            TypeExpr::Float => "float",
            TypeExpr::Str => "str",
            TypeExpr::Bool => "bool",
            TypeExpr::Datetime => "datetime",
            TypeExpr::Uuid => "uuid",
            TypeExpr::List { .. } => "list",
            TypeExpr::Optional { .. } => "optional",
            TypeExpr::Union { .. } => "union",
            TypeExpr::Model { .. } => "model",
            TypeExpr::Custom { .. } => "custom",
        }
    }

    /// Shorthand for a list type.
    pub fn list(item: TypeExpr) -> Self {
        TypeExpr::List {
            item: Box::new(item),
        }
    }

    /// Shorthand for an optional type.
    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Optional {
            inner: Box::new(inner),
        }
    }

    /// Shorthand for a union type.
    pub fn union(alternatives: Vec<TypeExpr>) -> Self {
        TypeExpr::Union { alternatives }
    }

    /// Shorthand for a model reference.
    pub fn model(name: impl Into<String>) -> Self {
        TypeExpr::Model { model: name.into() }
    }

    /// Shorthand for a custom parser reference.
    pub fn custom(parser: impl Into<String>) -> Self {
        TypeExpr::Custom {
            parser: parser.into(),
        }
    }

    /// True if this type (at any nesting level) uses a custom parser.
    ///
    /// The compiled fast path does not represent custom parsers; a model
    /// containing one always runs interpreted.
    pub fn contains_custom(&self) -> bool {
        match self {
            TypeExpr::Custom { .. } => true,
            TypeExpr::List { item } => item.contains_custom(),
            TypeExpr::Optional { inner } => inner.contains_custom(),
            TypeExpr::Union { alternatives } => alternatives.iter().any(|a| a.contains_custom()),
            _ => false,
        }
    }

    /// Visits every model name referenced at any nesting level.
    pub fn referenced_models(&self, out: &mut Vec<String>) {
        match self {
            TypeExpr::Model { model } => out.push(model.clone()),
            TypeExpr::List { item } => item.referenced_models(out),
            TypeExpr::Optional { inner } => inner.referenced_models(out),
            TypeExpr::Union { alternatives } => {
                for alt in alternatives {
                    alt.referenced_models(out);
                }
            }
            _ => {}
        }
    }

    /// Visits every custom parser name referenced at any nesting level.
    pub fn referenced_parsers(&self, out: &mut Vec<String>) {
        match self {
            TypeExpr::Custom { parser } => out.push(parser.clone()),
            TypeExpr::List { item } => item.referenced_parsers(out),
            TypeExpr::Optional { inner } => inner.referenced_parsers(out),
            TypeExpr::Union { alternatives } => {
                for alt in alternatives {
                    alt.referenced_parsers(out);
                }
            }
            _ => {}
        }
    }
}

/// Constraint payload attached to a field.
///
/// Constraints are routed to the type layer they apply to during
/// compilation: numeric bounds reach int/float, length and pattern reach
/// str, item-count and uniqueness stick to the list layer. Inapplicable
/// constraints are a definition-time error, never silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    /// Inclusive numeric lower bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ge: Option<f64>,
    /// Inclusive numeric upper bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub le: Option<f64>,
    /// Value must be a multiple of this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    /// Minimum string length in characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    /// Maximum string length in characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    /// Regular expression the whole string must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Trim surrounding whitespace before checks
    pub trim: bool,
    /// Lowercase before checks
    pub lowercase: bool,
    /// Minimum number of list items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    /// Maximum number of list items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Reject duplicate list items
    pub unique_items: bool,
}

impl Constraints {
    /// True if no constraint is set.
    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }

    /// True if any numeric constraint is set.
    pub fn has_numeric(&self) -> bool {
        self.ge.is_some() || self.le.is_some() || self.multiple_of.is_some()
    }

    /// True if any string constraint or transform is set.
    pub fn has_string(&self) -> bool {
        self.min_len.is_some()
            || self.max_len.is_some()
            || self.pattern.is_some()
            || self.trim
            || self.lowercase
    }

    /// True if any list constraint is set.
    pub fn has_list(&self) -> bool {
        self.min_items.is_some() || self.max_items.is_some() || self.unique_items
    }

    /// Returns a copy with the list-layer constraints cleared.
    ///
    /// Used when routing the remaining constraints to the item type.
    pub(crate) fn without_list(&self) -> Constraints {
        Constraints {
            min_items: None,
            max_items: None,
            unique_items: false,
            ..self.clone()
        }
    }

    /// Narrows the numeric constraints to integer bounds.
    ///
    /// `ge: 0.5` on an int field means `ge: 1`; `le: 10.5` means `le: 10`.
    /// A fractional `multiple_of` is rejected at compile time, so the
    /// rounding here is exact. Both execution paths use this narrowing.
    pub(crate) fn int_bounds(&self) -> (Option<i64>, Option<i64>, Option<i64>) {
        let ge = self.ge.map(|b| b.ceil() as i64);
        let le = self.le.map(|b| b.floor() as i64);
        let multiple_of = self.multiple_of.map(|b| b.round() as i64);
        (ge, le, multiple_of)
    }
}

/// A single field declaration. Immutable once compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Field name, unique within the model
    pub name: String,
    /// Declared type
    #[serde(flatten)]
    pub ty: TypeExpr,
    /// Constraint payload
    #[serde(default, skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
    /// Whether the field must be present in input
    pub required: bool,
    /// Default substituted when the field is missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Per-model configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Report unknown input keys instead of ignoring them
    pub strict_extra: bool,
    /// Allow post-construction writes with single-field re-validation
    pub validate_assignment: bool,
    /// Override the engine-wide coercion mode for this model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_types: Option<bool>,
}

/// A complete model declaration: ordered fields plus configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDecl {
    /// Model name, unique within a registry
    pub name: String,
    /// Optional description, carried into the schema export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field declarations in declaration order
    pub fields: Vec<FieldDecl>,
    /// Per-model configuration
    #[serde(default)]
    pub config: ModelConfig,
    /// Cross-field hooks, keyed by field name. Never serialized.
    #[serde(skip)]
    pub field_hooks: HashMap<String, FieldHook>,
    /// Whole-model hook. Never serialized.
    #[serde(skip)]
    pub root_hook: Option<RootHook>,
}

impl ModelDecl {
    /// Looks up a field declaration by name.
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }
}
