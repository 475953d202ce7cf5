//! The type and constraint compiler.
//!
//! Turns a [`ModelDecl`] into an immutable [`ModelSpec`]: constraints are
//! checked for internal consistency and applicability, routed to the type
//! layer they bind to, and narrowed to their runtime form (integer bounds,
//! pre-built regexes). An unsupported type or a contradictory constraint
//! set fails here, at definition time, and can never surface while a
//! document is being validated.
//!
//! Compilation is deterministic: the same declaration always produces
//! behaviorally identical validators.

use regex::Regex;

use super::errors::{CompileError, CompileResult};
use super::spec::{FieldSpec, ModelSpec};
use super::types::{Constraints, FieldDecl, ModelDecl, TypeExpr};
use crate::validate::validator::{FloatChecks, IntChecks, ListChecks, StrChecks, Validator};

/// Compiles one declaration into a spec.
///
/// The spec's validator list is present unless a declaration uses a custom
/// parser, which the fast path does not represent — such models carry
/// `compiled: None` and always run interpreted.
pub(crate) fn compile_model(decl: &ModelDecl) -> CompileResult<ModelSpec> {
    // Unique field names
    for (i, field) in decl.fields.iter().enumerate() {
        if decl.fields[..i].iter().any(|f| f.name == field.name) {
            return Err(CompileError::duplicate_field(&decl.name, &field.name));
        }
    }

    // Hooks must attach to declared fields
    for hooked in decl.field_hooks.keys() {
        if decl.field(hooked).is_none() {
            return Err(CompileError::constraint_conflict(
                &decl.name,
                hooked,
                "hook attached to undeclared field",
            ));
        }
    }

    let representable = decl.fields.iter().all(|f| !f.ty.contains_custom());
    let mut validators = Vec::with_capacity(decl.fields.len());
    let mut fields = Vec::with_capacity(decl.fields.len());

    for field in &decl.fields {
        check_field(&decl.name, field)?;
        if representable {
            validators.push(compile_type(
                &decl.name,
                &field.name,
                &field.ty,
                &field.constraints,
            )?);
        }
        fields.push(FieldSpec {
            name: field.name.clone(),
            required: field.required,
            default: field.default.clone(),
        });
    }

    Ok(ModelSpec::new(
        decl.name.clone(),
        decl.description.clone(),
        fields,
        decl.fields.clone(),
        if representable { Some(validators) } else { None },
        decl.field_hooks.clone(),
        decl.root_hook.clone(),
        decl.config,
    ))
}

/// Compiles a standalone field declaration (handler parameters).
///
/// Returns `None` when the declaration uses a custom parser.
pub(crate) fn compile_field(
    owner: &str,
    field: &FieldDecl,
) -> CompileResult<Option<Validator>> {
    check_field(owner, field)?;
    if field.ty.contains_custom() {
        return Ok(None);
    }
    compile_type(owner, &field.name, &field.ty, &field.constraints).map(Some)
}

/// Definition-time checks for one field: required/default consistency,
/// constraint consistency, and constraint applicability to the type.
fn check_field(model: &str, field: &FieldDecl) -> CompileResult<()> {
    if field.required && field.default.is_some() {
        return Err(CompileError::constraint_conflict(
            model,
            &field.name,
            "a required field cannot carry a default",
        ));
    }

    let cons = &field.constraints;

    if let (Some(min), Some(max)) = (cons.ge, cons.le) {
        if min > max {
            return Err(CompileError::constraint_conflict(
                model,
                &field.name,
                format!("ge {} greater than le {}", min, max),
            ));
        }
    }
    if let (Some(min), Some(max)) = (cons.min_len, cons.max_len) {
        if min > max {
            return Err(CompileError::constraint_conflict(
                model,
                &field.name,
                format!("min_len {} greater than max_len {}", min, max),
            ));
        }
    }
    if let (Some(min), Some(max)) = (cons.min_items, cons.max_items) {
        if min > max {
            return Err(CompileError::constraint_conflict(
                model,
                &field.name,
                format!("min_items {} greater than max_items {}", min, max),
            ));
        }
    }
    if let Some(base) = cons.multiple_of {
        if base == 0.0 {
            return Err(CompileError::constraint_conflict(
                model,
                &field.name,
                "multiple_of must be non-zero",
            ));
        }
    }

    if let Some(pattern) = &cons.pattern {
        if let Err(e) = Regex::new(pattern) {
            return Err(CompileError::bad_pattern(model, &field.name, e.to_string()));
        }
    }

    let consumes = consumes(&field.ty);
    if cons.has_numeric() && !consumes.numeric {
        return Err(CompileError::constraint_conflict(
            model,
            &field.name,
            format!(
                "numeric constraints not applicable to {}",
                field.ty.type_name()
            ),
        ));
    }
    if cons.has_string() && !consumes.string {
        return Err(CompileError::constraint_conflict(
            model,
            &field.name,
            format!(
                "string constraints not applicable to {}",
                field.ty.type_name()
            ),
        ));
    }
    if cons.has_list() && !consumes.list {
        return Err(CompileError::constraint_conflict(
            model,
            &field.name,
            format!(
                "list constraints not applicable to {}",
                field.ty.type_name()
            ),
        ));
    }
    if let Some(base) = cons.multiple_of {
        if base.fract() != 0.0 && !consumes.float {
            return Err(CompileError::constraint_conflict(
                model,
                &field.name,
                "fractional multiple_of requires a float type",
            ));
        }
    }

    if let TypeExpr::Union { alternatives } = &field.ty {
        if alternatives.is_empty() {
            return Err(CompileError::unsupported_type(
                model,
                &field.name,
                "union needs at least one alternative",
            ));
        }
    }

    Ok(())
}

/// Which constraint groups a type can consume, at any nesting level.
#[derive(Debug, Clone, Copy, Default)]
struct Consumes {
    numeric: bool,
    float: bool,
    string: bool,
    list: bool,
}

fn consumes(ty: &TypeExpr) -> Consumes {
    match ty {
        TypeExpr::Int => Consumes {
            numeric: true,
            ..Consumes::default()
        },
        TypeExpr::Float => Consumes {
            numeric: true,
            float: true,
            ..Consumes::default()
        },
        TypeExpr::Str => Consumes {
            string: true,
            ..Consumes::default()
        },
        TypeExpr::Bool
        | TypeExpr::Datetime
        | TypeExpr::Uuid
        | TypeExpr::Model { .. }
        | TypeExpr::Custom { .. } => Consumes::default(),
        TypeExpr::List { item } => {
            let inner = consumes(item);
            Consumes {
                list: true,
                ..inner
            }
        }
        TypeExpr::Optional { inner } => consumes(inner),
        TypeExpr::Union { alternatives } => {
            let mut merged = Consumes::default();
            for alt in alternatives {
                let c = consumes(alt);
                merged.numeric |= c.numeric;
                merged.float |= c.float;
                merged.string |= c.string;
                merged.list |= c.list;
            }
            merged
        }
    }
}

/// Routes the constraints to the type layer they bind to and builds the
/// validator. List-layer constraints stick to the list; everything else
/// passes through to the layer that consumes it.
fn compile_type(
    model: &str,
    field: &str,
    ty: &TypeExpr,
    cons: &Constraints,
) -> CompileResult<Validator> {
    Ok(match ty {
        TypeExpr::Int => {
            let (ge, le, multiple_of) = cons.int_bounds();
            Validator::Int(IntChecks { ge, le, multiple_of })
        }
        TypeExpr::Float => Validator::Float(FloatChecks {
            ge: cons.ge,
            le: cons.le,
            multiple_of: cons.multiple_of,
        }),
        TypeExpr::Str => {
            let pattern = match &cons.pattern {
                // Already vetted by check_field; compile the kept matcher here.
                Some(p) => match Regex::new(p) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        return Err(CompileError::bad_pattern(model, field, e.to_string()))
                    }
                },
                None => None,
            };
            Validator::Str(StrChecks {
                min_len: cons.min_len,
                max_len: cons.max_len,
                pattern,
                trim: cons.trim,
                lowercase: cons.lowercase,
            })
        }
        TypeExpr::Bool => Validator::Bool,
        TypeExpr::Datetime => Validator::Datetime,
        TypeExpr::Uuid => Validator::Uuid,
        TypeExpr::List { item } => Validator::List(ListChecks {
            item: Box::new(compile_type(model, field, item, &cons.without_list())?),
            min_items: cons.min_items,
            max_items: cons.max_items,
            unique_items: cons.unique_items,
        }),
        TypeExpr::Optional { inner } => {
            Validator::Optional(Box::new(compile_type(model, field, inner, cons)?))
        }
        TypeExpr::Union { alternatives } => {
            let mut compiled = Vec::with_capacity(alternatives.len());
            for alt in alternatives {
                compiled.push(compile_type(model, field, alt, cons)?);
            }
            Validator::Union(compiled)
        }
        TypeExpr::Model { model: referenced } => Validator::Model(referenced.clone()),
        TypeExpr::Custom { parser } => {
            return Err(CompileError::unsupported_type(
                model,
                field,
                format!("custom parser '{}' has no compiled form", parser),
            ))
        }
    })
}
