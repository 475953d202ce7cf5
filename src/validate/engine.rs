//! The validation engine.
//!
//! `Engine` drives one model validation call: it picks the execution path
//! (compiled validators when the spec carries them and the fast path is
//! enabled, the interpreter otherwise), creates the call's arena and
//! context, and converts the accumulated errors into a
//! [`ValidationFailure`]. A fast-path panic is caught at this boundary,
//! logged, and the call is re-run interpreted from scratch — the panicked
//! attempt's partial output is never consulted, so a correct rejection can
//! never turn into an acceptance.
//!
//! `check_object` is the shared structural driver: required/default
//! handling, extra-key policy, per-field dispatch, field hooks, and the
//! root hook. It is re-entered for every nested model.

use bumpalo::Bump;
use serde_json::{Map, Value};
use std::panic::{self, AssertUnwindSafe};

use crate::config::EngineConfig;
use crate::decl::{ModelSpec, SpecRegistry};
use crate::observability::{logger, Severity};
use crate::validate::context::{HostGuard, ValidationContext};
use crate::validate::errors::{ValidationError, ValidationFailure};
use crate::validate::interp;

/// Validation engine over a finalized registry.
///
/// The engine borrows the registry the way the rest of the read path does:
/// specs are shared immutably, and the engine itself holds no mutable
/// state, so one engine value can serve arbitrarily many calls.
pub struct Engine<'a> {
    registry: &'a SpecRegistry,
    config: EngineConfig,
}

impl<'a> Engine<'a> {
    /// Creates an engine over the given registry.
    pub fn new(registry: &'a SpecRegistry, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    /// The registry this engine resolves model references through.
    pub fn registry(&self) -> &'a SpecRegistry {
        self.registry
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates a mapping against a spec, returning the coerced mapping
    /// in declaration order or the full batch of field errors.
    pub fn validate_spec(
        &self,
        spec: &ModelSpec,
        data: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ValidationFailure> {
        if self.config.fast_path && spec.is_fast_path_capable() {
            let attempt =
                panic::catch_unwind(AssertUnwindSafe(|| self.run(spec, data, false)));
            match attempt {
                Ok(result) => {
                    return result.map_err(|errors| ValidationFailure::new(&spec.name, errors))
                }
                Err(_) => {
                    logger::emit_stderr(
                        Severity::Warn,
                        "fast_path_panic",
                        &[("model", spec.name.as_str())],
                    );
                }
            }
        }
        self.run(spec, data, true)
            .map_err(|errors| ValidationFailure::new(&spec.name, errors))
    }

    /// Re-validates a single field, used by validate-on-assignment. The
    /// field's hook, if any, sees the instance's current values.
    pub fn validate_field(
        &self,
        spec: &ModelSpec,
        field: &str,
        value: &Value,
        current: &Map<String, Value>,
    ) -> Result<Value, ValidationFailure> {
        let Some(index) = spec.field_index(field) else {
            return Err(ValidationFailure::single(
                &spec.name,
                ValidationError::extra_forbidden(field),
            ));
        };

        let interpreted = !self.config.fast_path || !spec.is_fast_path_capable();
        let arena = Bump::new();
        let mut ctx = ValidationContext::new(
            &arena,
            self.config.max_depth,
            spec.config.strict_types.unwrap_or(self.config.strict),
            interpreted,
        );

        let coerced = match (&spec.compiled, interpreted) {
            (Some(validators), false) => {
                validators[index].validate(value, field, &mut ctx, self.registry)
            }
            _ => {
                let decl = &spec.decls[index];
                interp::check_value(&decl.ty, &decl.constraints, value, field, &mut ctx, self.registry)
            }
        };

        let coerced = coerced.and_then(|v| {
            apply_field_hook(spec, field, v, current, field, &mut ctx)
        });

        match coerced {
            Some(v) if ctx.error_count() == 0 => Ok(v),
            _ => Err(ValidationFailure::new(&spec.name, ctx.take_errors())),
        }
    }

    fn run(
        &self,
        spec: &ModelSpec,
        data: &Map<String, Value>,
        interpreted: bool,
    ) -> Result<Map<String, Value>, Vec<ValidationError>> {
        let arena = Bump::new();
        let mut ctx =
            ValidationContext::new(&arena, self.config.max_depth, self.config.strict, interpreted);
        match check_object(spec, data, "", &mut ctx, self.registry) {
            Some(out) if ctx.error_count() == 0 => Ok(out),
            _ => Err(ctx.take_errors()),
        }
    }
}

/// Structural validation of one mapping against one spec.
///
/// Shared by both execution paths; only the per-value dispatch differs.
/// Returns the coerced mapping in declaration order, or `None` with every
/// field failure recorded in the context.
pub(crate) fn check_object(
    spec: &ModelSpec,
    data: &Map<String, Value>,
    prefix: &str,
    ctx: &mut ValidationContext<'_>,
    registry: &SpecRegistry,
) -> Option<Map<String, Value>> {
    let prev_strict = ctx.strict;
    ctx.strict = spec.config.strict_types.unwrap_or(ctx.engine_strict);
    let result = check_object_inner(spec, data, prefix, ctx, registry);
    ctx.strict = prev_strict;
    result
}

fn check_object_inner(
    spec: &ModelSpec,
    data: &Map<String, Value>,
    prefix: &str,
    ctx: &mut ValidationContext<'_>,
    registry: &SpecRegistry,
) -> Option<Map<String, Value>> {
    let start = ctx.error_count();

    // Unknown keys are ignored unless the model is strict about them.
    if spec.config.strict_extra {
        for key in data.keys() {
            if spec.field_index(key).is_none() {
                let path = ctx.child_path(prefix, key);
                ctx.push_error(ValidationError::extra_forbidden(path));
            }
        }
    }

    let use_compiled = !ctx.interpreted && spec.compiled.is_some();
    let mut out = Map::new();

    for (i, field) in spec.fields.iter().enumerate() {
        let path = ctx.child_path(prefix, &field.name);
        let coerced = match data.get(&field.name) {
            Some(raw) => match (&spec.compiled, use_compiled) {
                (Some(validators), true) => validators[i].validate(raw, path, ctx, registry),
                _ => {
                    let decl = &spec.decls[i];
                    interp::check_value(&decl.ty, &decl.constraints, raw, path, ctx, registry)
                }
            },
            None => {
                if field.required {
                    ctx.push_error(ValidationError::missing(path));
                    None
                } else {
                    Some(field.default.clone().unwrap_or(Value::Null))
                }
            }
        };

        if let Some(v) = coerced {
            if let Some(v) = apply_field_hook(spec, &field.name, v, &out, path, ctx) {
                out.insert(field.name.clone(), v);
            }
        }
    }

    if ctx.error_count() > start {
        return None;
    }

    // Root hook runs once, only after every field passed individually.
    if let Some(hook) = &spec.root_hook {
        let outcome = {
            let _guard = HostGuard::pause();
            hook.call(&out)
        };
        match outcome {
            Ok(Some(replacement)) => out = replacement,
            Ok(None) => {}
            Err(msg) => {
                let path = if prefix.is_empty() { "$root" } else { prefix };
                ctx.push_error(ValidationError::custom(path, msg, None));
                return None;
            }
        }
    }

    Some(out)
}

/// Runs the field's hook, if any, under a host-collector pause.
fn apply_field_hook(
    spec: &ModelSpec,
    field: &str,
    value: Value,
    so_far: &Map<String, Value>,
    path: &str,
    ctx: &mut ValidationContext<'_>,
) -> Option<Value> {
    let Some(hook) = spec.field_hooks.get(field) else {
        return Some(value);
    };
    let outcome = {
        let _guard = HostGuard::pause();
        hook.call(&value, so_far)
    };
    match outcome {
        Ok(Some(replacement)) => Some(replacement),
        Ok(None) => Some(value),
        Err(msg) => {
            ctx.push_error(ValidationError::custom(path, msg, Some(value)));
            None
        }
    }
}
