//! Structural schema export.
//!
//! Derives a field → {type, constraints, required, default} description
//! straight from the compiled spec. Nothing is re-validated; the export
//! is a pure projection.

use serde::Serialize;
use serde_json::Value;

use crate::decl::types::TypeExpr;
use crate::decl::{Constraints, ModelSpec};

/// One field's structural description.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSchema {
    /// Field name
    pub name: String,
    /// Rendered type label, e.g. `list[model[item]]`
    #[serde(rename = "type")]
    pub type_label: String,
    /// Whether the field must be present
    pub required: bool,
    /// Default substituted when missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Declared constraints
    #[serde(skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
}

/// A model's structural description.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSchema {
    /// Model name
    pub model: String,
    /// Declared description, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields in declaration order
    pub fields: Vec<FieldSchema>,
}

impl ModelSchema {
    /// Projects a spec into its structural description.
    pub fn from_spec(spec: &ModelSpec) -> Self {
        let fields = spec
            .decls
            .iter()
            .map(|decl| FieldSchema {
                name: decl.name.clone(),
                type_label: type_label(&decl.ty),
                required: decl.required,
                default: decl.default.clone(),
                constraints: decl.constraints.clone(),
            })
            .collect();
        Self {
            model: spec.name.clone(),
            description: spec.description.clone(),
            fields,
        }
    }

    /// Serializes the description to a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Renders a type expression as a compact label.
pub fn type_label(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Int
        | TypeExpr::Float
        | TypeExpr::Str
        | TypeExpr::Bool
        | TypeExpr::Datetime
        | TypeExpr::Uuid => ty.type_name().to_string(),
        TypeExpr::List { item } => format!("list[{}]", type_label(item)),
        TypeExpr::Optional { inner } => format!("optional[{}]", type_label(inner)),
        TypeExpr::Union { alternatives } => {
            let labels: Vec<String> = alternatives.iter().map(type_label).collect();
            format!("union[{}]", labels.join("|"))
        }
        TypeExpr::Model { model } => format!("model[{}]", model),
        TypeExpr::Custom { parser } => format!("custom[{}]", parser),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{Field, ModelBuilder, SpecRegistry};
    use serde_json::json;

    #[test]
    fn test_type_labels() {
        assert_eq!(type_label(&TypeExpr::Int), "int");
        assert_eq!(type_label(&TypeExpr::list(TypeExpr::Str)), "list[str]");
        assert_eq!(
            type_label(&TypeExpr::optional(TypeExpr::model("user"))),
            "optional[model[user]]"
        );
        assert_eq!(
            type_label(&TypeExpr::union(vec![TypeExpr::Int, TypeExpr::Str])),
            "union[int|str]"
        );
    }

    #[test]
    fn test_schema_export_projects_spec() {
        let registry = SpecRegistry::new();
        registry
            .register(
                ModelBuilder::new("user")
                    .description("a user record")
                    .field(Field::required("name", TypeExpr::Str).min_len(2).max_len(40))
                    .field(Field::with_default("age", TypeExpr::Int, json!(0)))
                    .build(),
            )
            .unwrap();
        registry.finalize().unwrap();

        let spec = registry.get("user").unwrap();
        let schema = ModelSchema::from_spec(&spec);
        assert_eq!(schema.model, "user");
        assert_eq!(schema.description.as_deref(), Some("a user record"));
        assert_eq!(schema.fields.len(), 2);

        let value = schema.to_value();
        assert_eq!(value["fields"][0]["name"], "name");
        assert_eq!(value["fields"][0]["type"], "str");
        assert_eq!(value["fields"][0]["required"], true);
        assert_eq!(value["fields"][0]["constraints"]["min_len"], 2);
        assert_eq!(value["fields"][1]["default"], 0);
        // No constraints key when the field has none.
        assert!(value["fields"][1].get("constraints").is_none());
    }
}
