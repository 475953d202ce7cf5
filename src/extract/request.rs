//! Request-time extraction — the second phase.
//!
//! Executes a compiled [`HandlerPlan`] against the raw request data the
//! routing layer hands over: path captures, the query string, headers,
//! and body bytes. Every failing parameter is reported in one structured
//! failure; a handler is never invoked on partial arguments.
//!
//! Scalar parameters arrive as text, so they always validate in lax
//! coercion mode regardless of the engine default.

use bumpalo::Bump;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::plan::{HandlerPlan, ParamSource, PlannedParam};
use crate::validate::context::ValidationContext;
use crate::validate::interp;
use crate::validate::{Engine, ValidationError, ValidationFailure};

/// Raw request data supplied by the routing layer. This crate never
/// touches socket or transport state.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    /// Path captures by name
    pub path_params: HashMap<String, String>,
    /// Query-string pairs in arrival order; keys may repeat
    pub query: Vec<(String, String)>,
    /// Header map
    pub headers: HashMap<String, String>,
    /// Raw body bytes, when the request carried a body
    pub body: Option<Vec<u8>>,
}

impl RequestParts {
    /// Creates empty request parts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a path capture.
    pub fn with_path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Adds a query pair. Repeated keys accumulate.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the body from text.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into().into_bytes());
        self
    }
}

/// The validated keyword-argument mapping handed back for handler
/// invocation.
#[derive(Debug, Clone)]
pub struct BoundArgs {
    values: Map<String, Value>,
}

impl BoundArgs {
    /// Reads an argument by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Number of bound arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no arguments were bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the binding into its mapping.
    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}

impl HandlerPlan {
    /// Pulls, validates, and binds every parameter. On any failure the
    /// result lists every failing parameter, and the handler must not be
    /// invoked.
    pub fn extract(
        &self,
        parts: &RequestParts,
        engine: &Engine<'_>,
    ) -> Result<BoundArgs, ValidationFailure> {
        let mut errors = Vec::new();
        let mut values = Map::new();

        for param in &self.params {
            let path = format!("{}.{}", param.source.as_str(), param.decl.name);
            match pull_raw(param, parts) {
                Some(raw) => {
                    match validate_scalar(param, &raw, &path, engine) {
                        Ok(v) => {
                            values.insert(param.decl.name.clone(), v);
                        }
                        Err(mut param_errors) => errors.append(&mut param_errors),
                    }
                }
                None => {
                    if param.decl.required {
                        errors.push(ValidationError::missing(path));
                    } else {
                        values.insert(
                            param.decl.name.clone(),
                            param.decl.default.clone().unwrap_or(Value::Null),
                        );
                    }
                }
            }
        }

        if let Some(body) = &self.body {
            match validate_body(&body.model, parts, engine) {
                Ok(v) => {
                    values.insert(body.name.clone(), v);
                }
                Err(mut body_errors) => errors.append(&mut body_errors),
            }
        }

        if errors.is_empty() {
            Ok(BoundArgs { values })
        } else {
            Err(ValidationFailure::new(&self.handler, errors))
        }
    }
}

/// Pulls a parameter's raw value from its classified source.
fn pull_raw(param: &PlannedParam, parts: &RequestParts) -> Option<Value> {
    match param.source {
        ParamSource::Path => parts
            .path_params
            .get(&param.decl.name)
            .map(|s| Value::String(s.clone())),
        ParamSource::Query => {
            let matches: Vec<&str> = parts
                .query
                .iter()
                .filter(|(k, _)| k == &param.decl.name)
                .map(|(_, v)| v.as_str())
                .collect();
            if matches.is_empty() {
                None
            } else if param.wants_list {
                Some(Value::Array(
                    matches.iter().map(|v| Value::String(v.to_string())).collect(),
                ))
            } else {
                // Repeated keys for a scalar parameter: first one wins.
                Some(Value::String(matches[0].to_string()))
            }
        }
        ParamSource::Header => parts
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(&param.decl.name))
            .map(|(_, v)| Value::String(v.clone())),
        ParamSource::Body => None,
    }
}

/// Validates one scalar (or list-of-scalar) parameter in lax mode.
fn validate_scalar(
    param: &PlannedParam,
    raw: &Value,
    path: &str,
    engine: &Engine<'_>,
) -> Result<Value, Vec<ValidationError>> {
    let arena = Bump::new();
    let interpreted = !engine.config().fast_path;
    let mut ctx =
        ValidationContext::new(&arena, engine.config().max_depth, false, interpreted);

    let result = if interpreted {
        interp::check_value(
            &param.decl.ty,
            &param.decl.constraints,
            raw,
            path,
            &mut ctx,
            engine.registry(),
        )
    } else {
        param.validator.validate(raw, path, &mut ctx, engine.registry())
    };

    match result {
        Some(v) if ctx.error_count() == 0 => Ok(v),
        _ => Err(ctx.take_errors()),
    }
}

/// Parses and validates the body against its model, prefixing every error
/// path with `body`.
fn validate_body(
    model: &str,
    parts: &RequestParts,
    engine: &Engine<'_>,
) -> Result<Value, Vec<ValidationError>> {
    let Some(bytes) = &parts.body else {
        return Err(vec![ValidationError::missing("body")]);
    };

    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => return Err(vec![ValidationError::parse("body", e.to_string())]),
    };
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => return Err(vec![ValidationError::parse("body", e.to_string())]),
    };
    let Some(map) = value.as_object() else {
        return Err(vec![ValidationError::type_mismatch("body", "object", &value)]);
    };

    let Some(spec) = engine.registry().get(model) else {
        // Unreachable after plan build; reject rather than accept.
        return Err(vec![ValidationError::missing("body")]);
    };

    match engine.validate_spec(&spec, map) {
        Ok(validated) => Ok(Value::Object(validated)),
        Err(failure) => Err(failure
            .errors()
            .iter()
            .cloned()
            .map(|mut e| {
                e.path = if e.path.is_empty() || e.path == "$root" {
                    "body".to_string()
                } else {
                    format!("body.{}", e.path)
                };
                e
            })
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::decl::types::TypeExpr;
    use crate::decl::{Field, ModelBuilder, SpecRegistry};
    use crate::validate::ErrorKind;
    use serde_json::json;

    fn registry() -> SpecRegistry {
        let registry = SpecRegistry::new();
        registry
            .register(
                ModelBuilder::new("user")
                    .field(Field::required("name", TypeExpr::Str).min_len(2))
                    .field(Field::required("age", TypeExpr::Int).ge(0.0).le(120.0))
                    .build(),
            )
            .unwrap();
        registry.finalize().unwrap();
        registry
    }

    fn plan(registry: &SpecRegistry) -> HandlerPlan {
        HandlerPlan::builder("create_user")
            .path(Field::required("org_id", TypeExpr::Int))
            .query(Field::with_default("limit", TypeExpr::Int, json!(10)).ge(1.0).le(100.0))
            .header(Field::required("x-api-key", TypeExpr::Str).min_len(8))
            .body("user", "user")
            .build(registry)
            .unwrap()
    }

    #[test]
    fn test_full_extraction() {
        let registry = registry();
        let engine = Engine::new(&registry, EngineConfig::default());
        let plan = plan(&registry);

        let parts = RequestParts::new()
            .with_path("org_id", "42")
            .with_query("limit", "25")
            .with_header("X-Api-Key", "secret-key-1")
            .with_body("{\"name\": \"Alice\", \"age\": 30}");

        let args = plan.extract(&parts, &engine).unwrap();
        assert_eq!(args.get("org_id"), Some(&json!(42)));
        assert_eq!(args.get("limit"), Some(&json!(25)));
        assert_eq!(args.get("x-api-key"), Some(&json!("secret-key-1")));
        assert_eq!(args.get("user").and_then(|u| u.get("name")), Some(&json!("Alice")));
    }

    #[test]
    fn test_defaults_fill_missing_optionals() {
        let registry = registry();
        let engine = Engine::new(&registry, EngineConfig::default());
        let plan = plan(&registry);

        let parts = RequestParts::new()
            .with_path("org_id", "42")
            .with_header("x-api-key", "secret-key-1")
            .with_body("{\"name\": \"Alice\", \"age\": 30}");

        let args = plan.extract(&parts, &engine).unwrap();
        assert_eq!(args.get("limit"), Some(&json!(10)));
    }

    #[test]
    fn test_every_failing_parameter_is_reported() {
        let registry = registry();
        let engine = Engine::new(&registry, EngineConfig::default());
        let plan = plan(&registry);

        // Bad path, bad query, missing header, body with two bad fields.
        let parts = RequestParts::new()
            .with_path("org_id", "abc")
            .with_query("limit", "0")
            .with_body("{\"name\": \"A\", \"age\": 200}");

        let err = plan.extract(&parts, &engine).unwrap_err();
        let paths: Vec<&str> = err.errors().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(err.error_count(), 5);
        assert!(paths.contains(&"path.org_id"));
        assert!(paths.contains(&"query.limit"));
        assert!(paths.contains(&"header.x-api-key"));
        assert!(paths.contains(&"body.name"));
        assert!(paths.contains(&"body.age"));
    }

    #[test]
    fn test_malformed_body_is_single_parse_error() {
        let registry = registry();
        let engine = Engine::new(&registry, EngineConfig::default());
        let plan = plan(&registry);

        let parts = RequestParts::new()
            .with_path("org_id", "1")
            .with_header("x-api-key", "secret-key-1")
            .with_body("{\"name\": ");

        let err = plan.extract(&parts, &engine).unwrap_err();
        assert_eq!(err.error_count(), 1);
        assert_eq!(err.errors()[0].path, "body");
        assert_eq!(err.errors()[0].kind, ErrorKind::Parse);
    }

    #[test]
    fn test_repeated_query_keys_build_lists() {
        let registry = registry();
        let engine = Engine::new(&registry, EngineConfig::default());
        let plan = HandlerPlan::builder("search")
            .query(Field::with_default("tag", TypeExpr::list(TypeExpr::Str), json!([])).max_items(3))
            .build(&registry)
            .unwrap();

        let parts = RequestParts::new()
            .with_query("tag", "rust")
            .with_query("tag", "db");
        let args = plan.extract(&parts, &engine).unwrap();
        assert_eq!(args.get("tag"), Some(&json!(["rust", "db"])));

        let parts = RequestParts::new()
            .with_query("tag", "a")
            .with_query("tag", "b")
            .with_query("tag", "c")
            .with_query("tag", "d");
        let err = plan.extract(&parts, &engine).unwrap_err();
        assert_eq!(err.errors()[0].path, "query.tag");
    }

    #[test]
    fn test_headers_match_case_insensitively() {
        let registry = registry();
        let engine = Engine::new(&registry, EngineConfig::default());
        let plan = HandlerPlan::builder("h")
            .header(Field::required("X-Trace-Id", TypeExpr::Uuid))
            .build(&registry)
            .unwrap();

        let parts =
            RequestParts::new().with_header("x-trace-id", "67e55044-10b1-426f-9247-bb680e5fe0c8");
        let args = plan.extract(&parts, &engine).unwrap();
        assert_eq!(
            args.get("X-Trace-Id"),
            Some(&json!("67e55044-10b1-426f-9247-bb680e5fe0c8"))
        );
    }

    #[test]
    fn test_scalar_params_stay_lax_under_strict_engine() {
        let registry = registry();
        let config = EngineConfig {
            strict: true,
            ..EngineConfig::default()
        };
        let engine = Engine::new(&registry, config);
        let plan = HandlerPlan::builder("h")
            .query(Field::required("limit", TypeExpr::Int))
            .build(&registry)
            .unwrap();

        // Query values are text; "25" must still coerce.
        let parts = RequestParts::new().with_query("limit", "25");
        let args = plan.extract(&parts, &engine).unwrap();
        assert_eq!(args.get("limit"), Some(&json!(25)));
    }
}
