//! The fallback interpreter — the slow path.
//!
//! Walks the raw field declarations directly, with no reliance on the
//! compiled validator tree: integer bounds are narrowed per call, patterns
//! are built per call, constraint routing is re-derived from the type
//! expression. It runs when a declaration uses a feature the fast path
//! does not represent (custom parsers), when the fast path hits an
//! unexpected internal error, or when configuration disables the fast
//! path.
//!
//! Accept/reject decisions and coerced values must be identical to the
//! fast path for every shared feature — the equivalence suite in
//! `tests/equivalence.rs` holds both paths to that contract.

use regex::Regex;
use serde_json::Value;

use crate::decl::types::{Constraints, TypeExpr};
use crate::decl::SpecRegistry;
use crate::validate::context::{HostGuard, ValidationContext};
use crate::validate::errors::ValidationError;
use crate::validate::validator::{
    check_bool, check_datetime, check_float, check_int, check_item_count, check_str,
    check_uniqueness, check_uuid, validate_model_ref, validate_union_with,
};

/// Interprets one declaration against one raw value. Same contract as the
/// compiled `Validator::validate`: coerced value on success, `None` with
/// recorded errors on failure.
pub(crate) fn check_value(
    ty: &TypeExpr,
    cons: &Constraints,
    value: &Value,
    path: &str,
    ctx: &mut ValidationContext<'_>,
    registry: &SpecRegistry,
) -> Option<Value> {
    match ty {
        TypeExpr::Int => {
            let (ge, le, multiple_of) = cons.int_bounds();
            check_int(value, path, ge, le, multiple_of, ctx)
        }
        TypeExpr::Float => check_float(value, path, cons.ge, cons.le, cons.multiple_of, ctx),
        TypeExpr::Str => {
            let pattern = match &cons.pattern {
                Some(p) => match Regex::new(p) {
                    Ok(re) => Some(re),
                    Err(_) => {
                        // The declaration was vetted at compile time, so
                        // this cannot happen; reject rather than accept.
                        ctx.push_error(ValidationError::constraint(
                            path,
                            format!("pattern '{}' failed to build", p),
                            value,
                        ));
                        return None;
                    }
                },
                None => None,
            };
            check_str(
                value,
                path,
                cons.min_len,
                cons.max_len,
                pattern.as_ref(),
                cons.trim,
                cons.lowercase,
                ctx,
            )
        }
        TypeExpr::Bool => check_bool(value, path, ctx),
        TypeExpr::Datetime => check_datetime(value, path, ctx),
        TypeExpr::Uuid => check_uuid(value, path, ctx),
        TypeExpr::List { item } => {
            let items = match value.as_array() {
                Some(items) => items,
                None => {
                    ctx.push_error(ValidationError::type_mismatch(path, "list", value));
                    return None;
                }
            };

            let mut failed = check_item_count(
                items.len(),
                path,
                cons.min_items,
                cons.max_items,
                value,
                ctx,
            );

            let item_cons = cons.without_list();
            let mut coerced = Vec::with_capacity(items.len());
            for (i, raw) in items.iter().enumerate() {
                let item_path = ctx.index_path(path, i);
                match check_value(item, &item_cons, raw, item_path, ctx, registry) {
                    Some(v) => coerced.push(v),
                    None => failed = true,
                }
            }

            if !failed && cons.unique_items {
                failed = check_uniqueness(&coerced, path, ctx);
            }

            if failed {
                None
            } else {
                Some(Value::Array(coerced))
            }
        }
        TypeExpr::Optional { inner } => {
            if value.is_null() {
                Some(Value::Null)
            } else {
                check_value(inner, cons, value, path, ctx, registry)
            }
        }
        TypeExpr::Union { alternatives } => {
            validate_union_with(alternatives, value, path, ctx, |alt, ctx| {
                (
                    alt.type_name(),
                    check_value(alt, cons, value, path, ctx, registry),
                )
            })
        }
        TypeExpr::Model { model } => validate_model_ref(model, value, path, ctx, registry),
        TypeExpr::Custom { parser } => {
            let Some(parser) = registry.parser(parser) else {
                // Unreachable after finalize; reject rather than accept.
                ctx.push_error(ValidationError::constraint(
                    path,
                    format!("unknown parser '{}'", parser),
                    value,
                ));
                return None;
            };
            let outcome = {
                let _guard = HostGuard::pause();
                parser.call(value)
            };
            match outcome {
                Ok(v) => Some(v),
                Err(msg) => {
                    ctx.push_error(ValidationError::custom(path, msg, Some(value.clone())));
                    None
                }
            }
        }
    }
}
