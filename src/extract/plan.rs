//! Handler parameter classification — the registration-time phase.
//!
//! A handler's parameters are classified once, when the handler is
//! registered: each is path, query, header, or body, and scalar
//! parameters compile their validator up front. Request handling then
//! runs no reflection at all; it executes the plan.
//!
//! Planning errors are definition-time `CompileError`s, the same failure
//! policy as model compilation.

use std::fmt;

use crate::decl::types::TypeExpr;
use crate::decl::{compile_field, check_default, CompileError, CompileResult, FieldDecl, SpecRegistry};
use crate::validate::Validator;

/// Where a parameter's raw value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// A path capture, always required
    Path,
    /// A query-string entry; repeated keys form lists
    Query,
    /// A request header, matched case-insensitively
    Header,
    /// The request body, validated as a whole model
    Body,
}

impl ParamSource {
    /// Returns the source name used in error paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamSource::Path => "path",
            ParamSource::Query => "query",
            ParamSource::Header => "header",
            ParamSource::Body => "body",
        }
    }
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One classified scalar parameter with its compiled validator.
#[derive(Debug, Clone)]
pub struct PlannedParam {
    pub(crate) source: ParamSource,
    pub(crate) decl: FieldDecl,
    pub(crate) validator: Validator,
    /// True when the parameter expects repeated query keys as a list
    pub(crate) wants_list: bool,
}

/// The classified body parameter.
#[derive(Debug, Clone)]
pub struct BodyParam {
    /// Handler argument name the validated body binds to
    pub(crate) name: String,
    /// Model validated against the parsed body
    pub(crate) model: String,
}

/// A handler's compiled parameter plan.
#[derive(Debug, Clone)]
pub struct HandlerPlan {
    pub(crate) handler: String,
    pub(crate) params: Vec<PlannedParam>,
    pub(crate) body: Option<BodyParam>,
}

impl HandlerPlan {
    /// Starts a plan for the named handler.
    pub fn builder(handler: impl Into<String>) -> PlanBuilder {
        PlanBuilder {
            handler: handler.into(),
            params: Vec::new(),
            body: None,
        }
    }

    /// The handler name.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Number of classified parameters, body included.
    pub fn param_count(&self) -> usize {
        self.params.len() + usize::from(self.body.is_some())
    }

    /// Returns the classified source of a parameter, if declared.
    pub fn source_of(&self, name: &str) -> Option<ParamSource> {
        if self.body.as_ref().is_some_and(|b| b.name == name) {
            return Some(ParamSource::Body);
        }
        self.params
            .iter()
            .find(|p| p.decl.name == name)
            .map(|p| p.source)
    }
}

/// Builder accumulating parameter declarations before classification.
#[derive(Debug)]
pub struct PlanBuilder {
    handler: String,
    params: Vec<(ParamSource, FieldDecl)>,
    body: Option<BodyParam>,
}

impl PlanBuilder {
    /// Declares a path parameter. Path captures are always required.
    pub fn path(mut self, field: impl Into<FieldDecl>) -> Self {
        self.params.push((ParamSource::Path, field.into()));
        self
    }

    /// Declares a query parameter.
    pub fn query(mut self, field: impl Into<FieldDecl>) -> Self {
        self.params.push((ParamSource::Query, field.into()));
        self
    }

    /// Declares a header parameter, matched case-insensitively.
    pub fn header(mut self, field: impl Into<FieldDecl>) -> Self {
        self.params.push((ParamSource::Header, field.into()));
        self
    }

    /// Declares the body parameter: the named model validated as a whole
    /// mapping, bound to the given argument name.
    pub fn body(mut self, name: impl Into<String>, model: impl Into<String>) -> Self {
        self.body = Some(BodyParam {
            name: name.into(),
            model: model.into(),
        });
        self
    }

    /// Classifies and compiles the plan. Fails on duplicate names, a
    /// second body, non-scalar path/header types, unknown body models,
    /// and any constraint problem a model field would be rejected for.
    pub fn build(self, registry: &SpecRegistry) -> CompileResult<HandlerPlan> {
        let mut names: Vec<&str> = self.params.iter().map(|(_, d)| d.name.as_str()).collect();
        if let Some(body) = &self.body {
            names.push(&body.name);
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(CompileError::bad_param(
                    &self.handler,
                    *name,
                    "duplicate parameter name",
                ));
            }
        }

        if let Some(body) = &self.body {
            if !registry.contains(&body.model) {
                return Err(CompileError::unknown_model(&self.handler, &body.model));
            }
        }

        let mut params = Vec::with_capacity(self.params.len());
        for (source, decl) in self.params {
            let wants_list = matches!(decl.ty, TypeExpr::List { .. });

            match source {
                ParamSource::Path => {
                    if !decl.required {
                        return Err(CompileError::bad_param(
                            &self.handler,
                            &decl.name,
                            "path parameters are always required",
                        ));
                    }
                    if !is_scalar(&decl.ty) {
                        return Err(CompileError::bad_param(
                            &self.handler,
                            &decl.name,
                            "path parameters must be scalar",
                        ));
                    }
                }
                ParamSource::Header => {
                    if !is_scalar(&decl.ty) {
                        return Err(CompileError::bad_param(
                            &self.handler,
                            &decl.name,
                            "header parameters must be scalar",
                        ));
                    }
                }
                ParamSource::Query => {
                    let ok = is_scalar(&decl.ty)
                        || matches!(&decl.ty, TypeExpr::List { item } if is_scalar(item));
                    if !ok {
                        return Err(CompileError::bad_param(
                            &self.handler,
                            &decl.name,
                            "query parameters must be scalar or a list of scalars",
                        ));
                    }
                }
                ParamSource::Body => unreachable!("body declared through body()"),
            }

            let validator = match compile_field(&self.handler, &decl)? {
                Some(validator) => validator,
                None => {
                    return Err(CompileError::bad_param(
                        &self.handler,
                        &decl.name,
                        "custom parsers are not supported for parameters",
                    ))
                }
            };
            check_default(registry, &self.handler, &decl)?;

            params.push(PlannedParam {
                source,
                decl,
                validator,
                wants_list,
            });
        }

        Ok(HandlerPlan {
            handler: self.handler,
            params,
            body: self.body,
        })
    }
}

/// Scalar parameter types: primitives, optionally wrapped in `Optional`,
/// or a union of scalars.
fn is_scalar(ty: &TypeExpr) -> bool {
    match ty {
        TypeExpr::Int
        | TypeExpr::Float
        | TypeExpr::Str
        | TypeExpr::Bool
        | TypeExpr::Datetime
        | TypeExpr::Uuid => true,
        TypeExpr::Optional { inner } => is_scalar(inner),
        TypeExpr::Union { alternatives } => alternatives.iter().all(is_scalar),
        TypeExpr::List { .. } | TypeExpr::Model { .. } | TypeExpr::Custom { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{CompileErrorCode, Field, ModelBuilder};
    use serde_json::json;

    fn registry_with_user() -> SpecRegistry {
        let registry = SpecRegistry::new();
        registry
            .register(
                ModelBuilder::new("user")
                    .field(Field::required("name", TypeExpr::Str).min_len(2))
                    .build(),
            )
            .unwrap();
        registry.finalize().unwrap();
        registry
    }

    #[test]
    fn test_classification() {
        let registry = registry_with_user();
        let plan = HandlerPlan::builder("create_user")
            .path(Field::required("org_id", TypeExpr::Int))
            .query(Field::with_default("limit", TypeExpr::Int, json!(10)))
            .header(Field::required("x-api-key", TypeExpr::Str).min_len(8))
            .body("user", "user")
            .build(&registry)
            .unwrap();

        assert_eq!(plan.param_count(), 4);
        assert_eq!(plan.source_of("org_id"), Some(ParamSource::Path));
        assert_eq!(plan.source_of("limit"), Some(ParamSource::Query));
        assert_eq!(plan.source_of("x-api-key"), Some(ParamSource::Header));
        assert_eq!(plan.source_of("user"), Some(ParamSource::Body));
        assert_eq!(plan.source_of("ghost"), None);
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let registry = registry_with_user();
        let err = HandlerPlan::builder("h")
            .path(Field::required("id", TypeExpr::Int))
            .query(Field::required("id", TypeExpr::Int))
            .build(&registry)
            .unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::BadParam);
    }

    #[test]
    fn test_optional_path_parameter_rejected() {
        let registry = registry_with_user();
        let err = HandlerPlan::builder("h")
            .path(Field::with_default("id", TypeExpr::Int, json!(1)))
            .build(&registry)
            .unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::BadParam);
    }

    #[test]
    fn test_non_scalar_path_and_header_rejected() {
        let registry = registry_with_user();
        let err = HandlerPlan::builder("h")
            .path(Field::required("ids", TypeExpr::list(TypeExpr::Int)))
            .build(&registry)
            .unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::BadParam);

        let err = HandlerPlan::builder("h")
            .header(Field::required("x-user", TypeExpr::model("user")))
            .build(&registry)
            .unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::BadParam);
    }

    #[test]
    fn test_query_list_of_scalars_allowed() {
        let registry = registry_with_user();
        let plan = HandlerPlan::builder("h")
            .query(Field::with_default(
                "tag",
                TypeExpr::list(TypeExpr::Str),
                json!([]),
            ))
            .build(&registry)
            .unwrap();
        assert!(plan.params[0].wants_list);
    }

    #[test]
    fn test_unknown_body_model_rejected() {
        let registry = registry_with_user();
        let err = HandlerPlan::builder("h")
            .body("payload", "ghost")
            .build(&registry)
            .unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::UnknownModel);
    }

    #[test]
    fn test_param_constraint_conflicts_rejected() {
        let registry = registry_with_user();
        let err = HandlerPlan::builder("h")
            .query(Field::required("limit", TypeExpr::Int).ge(10.0).le(1.0))
            .build(&registry)
            .unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::ConstraintConflict);
    }

    #[test]
    fn test_bad_param_default_rejected() {
        let registry = registry_with_user();
        let err = HandlerPlan::builder("h")
            .query(Field::with_default("limit", TypeExpr::Int, json!(0)).ge(1.0))
            .build(&registry)
            .unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::BadDefault);
    }
}
