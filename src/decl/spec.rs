//! Compiled model specs.
//!
//! A `ModelSpec` is the immutable output of compiling one declaration:
//! ordered field specs, a name→index table, the original declarations (the
//! interpreter's input), and — when every declared type is representable —
//! the compiled validator list. Specs are built once per declaration,
//! cached in the registry, and shared read-only for the process lifetime.

use serde_json::Value;
use std::collections::HashMap;

use super::hooks::{FieldHook, RootHook};
use super::types::{FieldDecl, ModelConfig};
use crate::validate::Validator;

/// One compiled field: the request-time essentials, in declaration order.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Whether the field must be present in input
    pub required: bool,
    /// Default substituted when the field is missing
    pub default: Option<Value>,
}

/// Compiled, immutable description of a model.
#[derive(Debug)]
pub struct ModelSpec {
    /// Model name
    pub name: String,
    /// Optional description carried into the schema export
    pub description: Option<String>,
    /// Field specs in declaration order
    pub fields: Vec<FieldSpec>,
    /// Original field declarations, same order — the interpreter's input
    pub decls: Vec<FieldDecl>,
    /// Compiled validators, same order. `None` when a declaration uses a
    /// feature the fast path does not represent (custom parsers).
    pub compiled: Option<Vec<Validator>>,
    /// Cross-field hooks keyed by field name
    pub field_hooks: HashMap<String, FieldHook>,
    /// Whole-model hook
    pub root_hook: Option<RootHook>,
    /// Per-model configuration
    pub config: ModelConfig,
    index: HashMap<String, usize>,
}

impl ModelSpec {
    pub(crate) fn new(
        name: String,
        description: Option<String>,
        fields: Vec<FieldSpec>,
        decls: Vec<FieldDecl>,
        compiled: Option<Vec<Validator>>,
        field_hooks: HashMap<String, FieldHook>,
        root_hook: Option<RootHook>,
        config: ModelConfig,
    ) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self {
            name,
            description,
            fields,
            decls,
            compiled,
            field_hooks,
            root_hook,
            config,
            index,
        }
    }

    /// Number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Looks up a field's position by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// True if the fast path can execute this spec.
    pub fn is_fast_path_capable(&self) -> bool {
        self.compiled.is_some()
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::builder::{Field, ModelBuilder};
    use crate::decl::compiler::compile_model;
    use crate::decl::types::TypeExpr;

    fn compiled_spec() -> ModelSpec {
        let decl = ModelBuilder::new("user")
            .field(Field::required("name", TypeExpr::Str))
            .field(Field::required("age", TypeExpr::Int))
            .build();
        compile_model(&decl).unwrap()
    }

    #[test]
    fn test_index_matches_declaration_order() {
        let spec = compiled_spec();
        assert_eq!(spec.field_index("name"), Some(0));
        assert_eq!(spec.field_index("age"), Some(1));
        assert_eq!(spec.field_index("missing"), None);
        let names: Vec<&str> = spec.field_names().collect();
        assert_eq!(names, vec!["name", "age"]);
    }

    #[test]
    fn test_plain_model_is_fast_path_capable() {
        assert!(compiled_spec().is_fast_path_capable());
    }
}
