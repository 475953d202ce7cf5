//! Compiled validators — the fast path.
//!
//! A `Validator` is the compiled form of one field declaration: constraint
//! payloads are narrowed to their runtime representation (integer bounds as
//! `i64`, patterns as pre-built `regex::Regex`) so request-time validation
//! does no parsing or re-interpretation. Validators are immutable,
//! stateless, and shared read-only across threads.
//!
//! The leaf check functions (`check_int`, `check_str`, ...) are the single
//! source of truth for primitive coercion semantics. The interpreted path
//! calls the same functions with bounds it re-derives per call, which keeps
//! the two paths from drifting apart.

use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

use crate::decl::SpecRegistry;
use crate::validate::context::ValidationContext;
use crate::validate::errors::{ErrorKind, ValidationError};

/// Compiled integer checks. Bounds are narrowed to `i64` at compile time.
#[derive(Debug, Clone)]
pub struct IntChecks {
    pub ge: Option<i64>,
    pub le: Option<i64>,
    pub multiple_of: Option<i64>,
}

/// Compiled float checks.
#[derive(Debug, Clone)]
pub struct FloatChecks {
    pub ge: Option<f64>,
    pub le: Option<f64>,
    pub multiple_of: Option<f64>,
}

/// Compiled string checks. The pattern is built once at compile time.
#[derive(Debug, Clone)]
pub struct StrChecks {
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub pattern: Option<Regex>,
    pub trim: bool,
    pub lowercase: bool,
}

/// Compiled list checks wrapping the item validator.
#[derive(Debug, Clone)]
pub struct ListChecks {
    pub item: Box<Validator>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: bool,
}

/// A compiled, reusable validation unit.
#[derive(Debug, Clone)]
pub enum Validator {
    Int(IntChecks),
    Float(FloatChecks),
    Str(StrChecks),
    Bool,
    Datetime,
    Uuid,
    List(ListChecks),
    Optional(Box<Validator>),
    Union(Vec<Validator>),
    /// Nested model, resolved by name through the registry at run time
    Model(String),
}

impl Validator {
    /// Returns the validator kind name, matching the declared type name.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Validator::Int(_) => "int",
            Validator::Float(_) => "float",
            Validator::Str(_) => "str",
            Validator::Bool => "bool",
            Validator::Datetime => "datetime",
            Validator::Uuid => "uuid",
            Validator::List(_) => "list",
            Validator::Optional(_) => "optional",
            Validator::Union(_) => "union",
            Validator::Model(_) => "model",
        }
    }

    /// Validates one raw value. On success returns the coerced value; on
    /// failure records errors in the context and returns `None`.
    pub fn validate(
        &self,
        value: &Value,
        path: &str,
        ctx: &mut ValidationContext<'_>,
        registry: &SpecRegistry,
    ) -> Option<Value> {
        match self {
            Validator::Int(checks) => {
                check_int(value, path, checks.ge, checks.le, checks.multiple_of, ctx)
            }
            Validator::Float(checks) => {
                check_float(value, path, checks.ge, checks.le, checks.multiple_of, ctx)
            }
            Validator::Str(checks) => check_str(
                value,
                path,
                checks.min_len,
                checks.max_len,
                checks.pattern.as_ref(),
                checks.trim,
                checks.lowercase,
                ctx,
            ),
            Validator::Bool => check_bool(value, path, ctx),
            Validator::Datetime => check_datetime(value, path, ctx),
            Validator::Uuid => check_uuid(value, path, ctx),
            Validator::List(checks) => self.validate_list(checks, value, path, ctx, registry),
            Validator::Optional(inner) => {
                if value.is_null() {
                    Some(Value::Null)
                } else {
                    inner.validate(value, path, ctx, registry)
                }
            }
            Validator::Union(alternatives) => {
                validate_union_with(alternatives, value, path, ctx, |alt, ctx| {
                    (alt.kind_name(), alt.validate(value, path, ctx, registry))
                })
            }
            Validator::Model(name) => validate_model_ref(name, value, path, ctx, registry),
        }
    }

    fn validate_list(
        &self,
        checks: &ListChecks,
        value: &Value,
        path: &str,
        ctx: &mut ValidationContext<'_>,
        registry: &SpecRegistry,
    ) -> Option<Value> {
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
            checks.min_items,
            checks.max_items,
            value,
            ctx,
        );

        let mut coerced = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_path = ctx.index_path(path, i);
            match checks.item.validate(item, item_path, ctx, registry) {
                Some(v) => coerced.push(v),
                None => failed = true,
            }
        }

        if !failed && checks.unique_items {
            failed = check_uniqueness(&coerced, path, ctx);
        }

        if failed {
            None
        } else {
            Some(Value::Array(coerced))
        }
    }
}

/// Resolves and validates a nested-model reference.
pub(crate) fn validate_model_ref(
    name: &str,
    value: &Value,
    path: &str,
    ctx: &mut ValidationContext<'_>,
    registry: &SpecRegistry,
) -> Option<Value> {
    let spec = match registry.get(name) {
        Some(spec) => spec,
        None => {
            // Unreachable after finalize; reject rather than accept.
            ctx.push_error(ValidationError {
                path: path.to_string(),
                message: format!("unknown model '{}'", name),
                kind: ErrorKind::ConstraintViolation,
                value: None,
            });
            return None;
        }
    };

    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            ctx.push_error(ValidationError::type_mismatch(path, "object", value));
            return None;
        }
    };

    if !ctx.descend(path) {
        return None;
    }
    let result = crate::validate::engine::check_object(&spec, obj, path, ctx, registry);
    ctx.ascend();
    result.map(Value::Object)
}

/// Tries union alternatives in declaration order; the first success wins.
/// On total failure, reports one combined error naming every alternative's
/// failure reason.
pub(crate) fn validate_union_with<A>(
    alternatives: &[A],
    value: &Value,
    path: &str,
    ctx: &mut ValidationContext<'_>,
    mut try_alt: impl FnMut(&A, &mut ValidationContext<'_>) -> (&'static str, Option<Value>),
) -> Option<Value> {
    let mut reasons = Vec::with_capacity(alternatives.len());
    for alt in alternatives {
        let mark = ctx.error_count();
        let (label, result) = try_alt(alt, ctx);
        match result {
            Some(v) => {
                ctx.rollback_to(mark);
                return Some(v);
            }
            None => {
                let messages = ctx.rollback_to(mark);
                let reason = messages
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| "failed".to_string());
                reasons.push(format!("{}: {}", label, reason));
            }
        }
    }
    ctx.push_error(ValidationError::union_mismatch(path, &reasons, value));
    None
}

/// Records at most one item-count error at the list path. Returns true if
/// the count is out of bounds.
pub(crate) fn check_item_count(
    len: usize,
    path: &str,
    min_items: Option<usize>,
    max_items: Option<usize>,
    value: &Value,
    ctx: &mut ValidationContext<'_>,
) -> bool {
    if let Some(min) = min_items {
        if len < min {
            ctx.push_error(ValidationError::constraint(
                path,
                format!("{} items below minimum {}", len, min),
                value,
            ));
            return true;
        }
    }
    if let Some(max) = max_items {
        if len > max {
            ctx.push_error(ValidationError::constraint(
                path,
                format!("{} items above maximum {}", len, max),
                value,
            ));
            return true;
        }
    }
    false
}

/// Hash-based duplicate detection over the items' serialized forms.
/// Returns true if a duplicate was found.
pub(crate) fn check_uniqueness(
    items: &[Value],
    path: &str,
    ctx: &mut ValidationContext<'_>,
) -> bool {
    let mut seen: HashSet<&str> = HashSet::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let key = match serde_json::to_string(item) {
            Ok(key) => ctx.arena().alloc_str(&key),
            Err(_) => continue,
        };
        if !seen.insert(key) {
            ctx.push_error(ValidationError::constraint(
                ctx.index_path(path, i),
                format!("duplicate item at index {}", i),
                item,
            ));
            return true;
        }
    }
    false
}

/// Integer type check, coercion, and bound checks.
pub(crate) fn check_int(
    value: &Value,
    path: &str,
    ge: Option<i64>,
    le: Option<i64>,
    multiple_of: Option<i64>,
    ctx: &mut ValidationContext<'_>,
) -> Option<Value> {
    let coerced = match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Some(v)
            } else if n.as_u64().is_some() {
                ctx.push_error(ValidationError {
                    path: path.to_string(),
                    message: "integer out of range".into(),
                    kind: ErrorKind::TypeCoercion,
                    value: Some(value.clone()),
                });
                return None;
            } else if !ctx.strict {
                n.as_f64().and_then(int_from_f64)
            } else {
                None
            }
        }
        Value::String(s) if !ctx.strict => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(int_from_f64))
        }
        _ => None,
    };

    let v = match coerced {
        Some(v) => v,
        None => {
            ctx.push_error(ValidationError::type_mismatch(path, "int", value));
            return None;
        }
    };

    if let Some(min) = ge {
        if v < min {
            ctx.push_error(ValidationError::constraint(
                path,
                format!("{} below minimum {}", v, min),
                value,
            ));
            return None;
        }
    }
    if let Some(max) = le {
        if v > max {
            ctx.push_error(ValidationError::constraint(
                path,
                format!("{} above maximum {}", v, max),
                value,
            ));
            return None;
        }
    }
    if let Some(base) = multiple_of {
        if base != 0 && v % base != 0 {
            ctx.push_error(ValidationError::constraint(
                path,
                format!("{} not a multiple of {}", v, base),
                value,
            ));
            return None;
        }
    }
    Some(Value::from(v))
}

fn int_from_f64(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Float type check, coercion, and bound checks.
pub(crate) fn check_float(
    value: &Value,
    path: &str,
    ge: Option<f64>,
    le: Option<f64>,
    multiple_of: Option<f64>,
    ctx: &mut ValidationContext<'_>,
) -> Option<Value> {
    let coerced = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !ctx.strict => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    let v = match coerced {
        Some(v) if v.is_finite() => v,
        _ => {
            ctx.push_error(ValidationError::type_mismatch(path, "float", value));
            return None;
        }
    };

    if let Some(min) = ge {
        if v < min {
            ctx.push_error(ValidationError::constraint(
                path,
                format!("{} below minimum {}", v, min),
                value,
            ));
            return None;
        }
    }
    if let Some(max) = le {
        if v > max {
            ctx.push_error(ValidationError::constraint(
                path,
                format!("{} above maximum {}", v, max),
                value,
            ));
            return None;
        }
    }
    if let Some(base) = multiple_of {
        if base != 0.0 && !is_multiple(v, base) {
            ctx.push_error(ValidationError::constraint(
                path,
                format!("{} not a multiple of {}", v, base),
                value,
            ));
            return None;
        }
    }

    match serde_json::Number::from_f64(v) {
        Some(n) => Some(Value::Number(n)),
        None => {
            ctx.push_error(ValidationError::type_mismatch(path, "float", value));
            None
        }
    }
}

/// Relative-epsilon multiple test, identical on both paths.
fn is_multiple(value: f64, base: f64) -> bool {
    let quotient = value / base;
    (quotient - quotient.round()).abs() < 1e-9
}

/// String type check, transforms, length, and pattern checks.
#[allow(clippy::too_many_arguments)]
pub(crate) fn check_str(
    value: &Value,
    path: &str,
    min_len: Option<usize>,
    max_len: Option<usize>,
    pattern: Option<&Regex>,
    trim: bool,
    lowercase: bool,
    ctx: &mut ValidationContext<'_>,
) -> Option<Value> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if !ctx.strict => n.to_string(),
        _ => {
            ctx.push_error(ValidationError::type_mismatch(path, "str", value));
            return None;
        }
    };

    let mut s = raw;
    if trim {
        s = s.trim().to_string();
    }
    if lowercase {
        s = s.to_lowercase();
    }

    let len = s.chars().count();
    if let Some(min) = min_len {
        if len < min {
            ctx.push_error(ValidationError::constraint(
                path,
                format!("length {} below minimum {}", len, min),
                value,
            ));
            return None;
        }
    }
    if let Some(max) = max_len {
        if len > max {
            ctx.push_error(ValidationError::constraint(
                path,
                format!("length {} above maximum {}", len, max),
                value,
            ));
            return None;
        }
    }
    if let Some(re) = pattern {
        if !re.is_match(&s) {
            ctx.push_error(ValidationError::constraint(
                path,
                format!("does not match pattern '{}'", re.as_str()),
                value,
            ));
            return None;
        }
    }
    Some(Value::String(s))
}

/// Boolean type check with strict-vs-lax coercion.
pub(crate) fn check_bool(
    value: &Value,
    path: &str,
    ctx: &mut ValidationContext<'_>,
) -> Option<Value> {
    let coerced = match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if !ctx.strict => match s.trim().to_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) if !ctx.strict => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    };

    match coerced {
        Some(b) => Some(Value::Bool(b)),
        None => {
            ctx.push_error(ValidationError::type_mismatch(path, "bool", value));
            None
        }
    }
}

/// RFC 3339 datetime check, normalized to canonical text.
pub(crate) fn check_datetime(
    value: &Value,
    path: &str,
    ctx: &mut ValidationContext<'_>,
) -> Option<Value> {
    let s = match value.as_str() {
        Some(s) => s,
        None => {
            ctx.push_error(ValidationError::type_mismatch(path, "datetime", value));
            return None;
        }
    };
    match chrono::DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Some(Value::String(dt.to_rfc3339())),
        Err(e) => {
            ctx.push_error(ValidationError {
                path: path.to_string(),
                message: format!("invalid RFC 3339 datetime: {}", e),
                kind: ErrorKind::TypeCoercion,
                value: Some(value.clone()),
            });
            None
        }
    }
}

/// UUID check, normalized to canonical hyphenated text.
pub(crate) fn check_uuid(
    value: &Value,
    path: &str,
    ctx: &mut ValidationContext<'_>,
) -> Option<Value> {
    let s = match value.as_str() {
        Some(s) => s,
        None => {
            ctx.push_error(ValidationError::type_mismatch(path, "uuid", value));
            return None;
        }
    };
    match uuid::Uuid::parse_str(s.trim()) {
        Ok(u) => Some(Value::String(u.hyphenated().to_string())),
        Err(e) => {
            ctx.push_error(ValidationError {
                path: path.to_string(),
                message: format!("invalid UUID: {}", e),
                kind: ErrorKind::TypeCoercion,
                value: Some(value.clone()),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use serde_json::json;

    fn lax_ctx(arena: &Bump) -> ValidationContext<'_> {
        ValidationContext::new(arena, 16, false, false)
    }

    fn strict_ctx(arena: &Bump) -> ValidationContext<'_> {
        ValidationContext::new(arena, 16, true, false)
    }

    #[test]
    fn test_int_lax_coercion() {
        let arena = Bump::new();
        let mut ctx = lax_ctx(&arena);
        assert_eq!(check_int(&json!(5), "n", None, None, None, &mut ctx), Some(json!(5)));
        assert_eq!(
            check_int(&json!("5"), "n", None, None, None, &mut ctx),
            Some(json!(5))
        );
        assert_eq!(
            check_int(&json!(5.0), "n", None, None, None, &mut ctx),
            Some(json!(5))
        );
        assert_eq!(check_int(&json!(5.5), "n", None, None, None, &mut ctx), None);
        assert_eq!(check_int(&json!(true), "n", None, None, None, &mut ctx), None);
    }

    #[test]
    fn test_int_strict_rejects_strings_and_floats() {
        let arena = Bump::new();
        let mut ctx = strict_ctx(&arena);
        assert_eq!(check_int(&json!(5), "n", None, None, None, &mut ctx), Some(json!(5)));
        assert_eq!(check_int(&json!("5"), "n", None, None, None, &mut ctx), None);
        assert_eq!(check_int(&json!(5.0), "n", None, None, None, &mut ctx), None);
    }

    #[test]
    fn test_int_bounds_and_multiple() {
        let arena = Bump::new();
        let mut ctx = lax_ctx(&arena);
        for ok in [0i64, 5, 10] {
            assert!(
                check_int(&json!(ok), "n", Some(0), Some(10), Some(5), &mut ctx).is_some(),
                "{} should pass",
                ok
            );
        }
        for bad in [1i64, 7, -5, 15] {
            assert!(
                check_int(&json!(bad), "n", Some(0), Some(10), Some(5), &mut ctx).is_none(),
                "{} should fail",
                bad
            );
        }
        // One error per failing value, first violated rule only.
        assert_eq!(ctx.error_count(), 4);
    }

    #[test]
    fn test_float_multiple_of_epsilon() {
        let arena = Bump::new();
        let mut ctx = lax_ctx(&arena);
        assert!(check_float(&json!(0.3), "n", None, None, Some(0.1), &mut ctx).is_some());
        assert!(check_float(&json!(0.35), "n", None, None, Some(0.1), &mut ctx).is_none());
    }

    #[test]
    fn test_str_transforms_run_before_checks() {
        let arena = Bump::new();
        let mut ctx = lax_ctx(&arena);
        let out = check_str(
            &json!("  ABC  "),
            "s",
            Some(2),
            Some(5),
            None,
            true,
            true,
            &mut ctx,
        );
        assert_eq!(out, Some(json!("abc")));
    }

    #[test]
    fn test_str_length_boundaries() {
        let arena = Bump::new();
        let mut ctx = lax_ctx(&arena);
        for len in [2usize, 3, 4, 5] {
            let s = "x".repeat(len);
            assert!(
                check_str(&json!(s), "s", Some(2), Some(5), None, false, false, &mut ctx)
                    .is_some(),
                "length {} should pass",
                len
            );
        }
        for len in [1usize, 6] {
            let s = "x".repeat(len);
            assert!(
                check_str(&json!(s), "s", Some(2), Some(5), None, false, false, &mut ctx)
                    .is_none(),
                "length {} should fail",
                len
            );
        }
    }

    #[test]
    fn test_str_pattern() {
        let arena = Bump::new();
        let mut ctx = lax_ctx(&arena);
        let re = Regex::new("^[a-z]+$").unwrap();
        assert!(
            check_str(&json!("abc"), "s", None, None, Some(&re), false, false, &mut ctx)
                .is_some()
        );
        assert!(
            check_str(&json!("abc1"), "s", None, None, Some(&re), false, false, &mut ctx)
                .is_none()
        );
    }

    #[test]
    fn test_bool_lax_accepts_common_encodings() {
        let arena = Bump::new();
        let mut ctx = lax_ctx(&arena);
        assert_eq!(check_bool(&json!(true), "b", &mut ctx), Some(json!(true)));
        assert_eq!(check_bool(&json!("true"), "b", &mut ctx), Some(json!(true)));
        assert_eq!(check_bool(&json!("0"), "b", &mut ctx), Some(json!(false)));
        assert_eq!(check_bool(&json!(1), "b", &mut ctx), Some(json!(true)));
        assert_eq!(check_bool(&json!("yes"), "b", &mut ctx), None);
        assert_eq!(check_bool(&json!(2), "b", &mut ctx), None);
    }

    #[test]
    fn test_bool_strict_accepts_only_bool() {
        let arena = Bump::new();
        let mut ctx = strict_ctx(&arena);
        assert_eq!(check_bool(&json!(true), "b", &mut ctx), Some(json!(true)));
        assert_eq!(check_bool(&json!("true"), "b", &mut ctx), None);
        assert_eq!(check_bool(&json!(1), "b", &mut ctx), None);
    }

    #[test]
    fn test_datetime_normalizes() {
        let arena = Bump::new();
        let mut ctx = lax_ctx(&arena);
        let out = check_datetime(&json!("2024-01-15T10:30:00Z"), "ts", &mut ctx);
        assert_eq!(out, Some(json!("2024-01-15T10:30:00+00:00")));
        assert_eq!(check_datetime(&json!("15/01/2024"), "ts", &mut ctx), None);
        assert_eq!(check_datetime(&json!(12345), "ts", &mut ctx), None);
    }

    #[test]
    fn test_uuid_normalizes_to_hyphenated() {
        let arena = Bump::new();
        let mut ctx = lax_ctx(&arena);
        let out = check_uuid(&json!("67E5504410B1426F9247BB680E5FE0C8"), "id", &mut ctx);
        assert_eq!(out, Some(json!("67e55044-10b1-426f-9247-bb680e5fe0c8")));
        assert_eq!(check_uuid(&json!("not-a-uuid"), "id", &mut ctx), None);
    }

    #[test]
    fn test_uniqueness_detects_duplicates() {
        let arena = Bump::new();
        let mut ctx = lax_ctx(&arena);
        let items = vec![json!(1), json!(2), json!(1)];
        assert!(check_uniqueness(&items, "tags", &mut ctx));
        let errors = ctx.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "tags.2");
    }

    #[test]
    fn test_item_count_reports_first_violation_only() {
        let arena = Bump::new();
        let mut ctx = lax_ctx(&arena);
        assert!(check_item_count(1, "tags", Some(2), Some(4), &json!([1]), &mut ctx));
        assert!(check_item_count(5, "tags", Some(2), Some(4), &json!([1, 2, 3, 4, 5]), &mut ctx));
        assert!(!check_item_count(3, "tags", Some(2), Some(4), &json!([1, 2, 3]), &mut ctx));
        assert_eq!(ctx.error_count(), 2);
    }
}
