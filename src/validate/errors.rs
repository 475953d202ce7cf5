//! Validation error taxonomy.
//!
//! Error kinds and codes:
//! - Parse               MODEL_PARSE_FAILED
//! - TypeCoercion        MODEL_TYPE_COERCION
//! - ConstraintViolation MODEL_CONSTRAINT_VIOLATION
//! - CustomValidator     MODEL_CUSTOM_VALIDATOR
//! - Missing             MODEL_FIELD_MISSING
//! - ExtraForbidden      MODEL_EXTRA_FORBIDDEN
//! - UnionMismatch       MODEL_UNION_MISMATCH
//! - RecursionLimit      MODEL_RECURSION_LIMIT
//!
//! One validation call accumulates one error per failing field — within a
//! single field only the first violated rule is reported. The caller
//! receives the full batch as a [`ValidationFailure`].

use serde_json::{json, Value};
use std::fmt;

/// Machine-readable error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed raw JSON text, before any field validation
    Parse,
    /// Value cannot convert to the declared type
    TypeCoercion,
    /// Value converts but violates a bound, pattern, length, or uniqueness rule
    ConstraintViolation,
    /// A user hook rejected the value
    CustomValidator,
    /// A required field or parameter is absent
    Missing,
    /// An unknown input key under strict extra-field handling
    ExtraForbidden,
    /// No union alternative accepted the value
    UnionMismatch,
    /// Nested-model depth exceeded the configured maximum
    RecursionLimit,
}

impl ErrorKind {
    /// Returns the stable string code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "MODEL_PARSE_FAILED",
            ErrorKind::TypeCoercion => "MODEL_TYPE_COERCION",
            ErrorKind::ConstraintViolation => "MODEL_CONSTRAINT_VIOLATION",
            ErrorKind::CustomValidator => "MODEL_CUSTOM_VALIDATOR",
            ErrorKind::Missing => "MODEL_FIELD_MISSING",
            ErrorKind::ExtraForbidden => "MODEL_EXTRA_FORBIDDEN",
            ErrorKind::UnionMismatch => "MODEL_UNION_MISMATCH",
            ErrorKind::RecursionLimit => "MODEL_RECURSION_LIMIT",
        }
    }

    /// True for kinds that abort the surrounding call rather than
    /// accumulating alongside other field errors.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::RecursionLimit)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single validation failure at one field path.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Dotted/indexed field path, e.g. `items.0.name`
    pub path: String,
    /// Human-readable message
    pub message: String,
    /// Machine-readable kind
    pub kind: ErrorKind,
    /// The offending raw value, when one exists
    pub value: Option<Value>,
}

impl ValidationError {
    /// A required field or parameter is absent.
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: "field is required".into(),
            kind: ErrorKind::Missing,
            value: None,
        }
    }

    /// The value has the wrong type for the declaration.
    pub fn type_mismatch(path: impl Into<String>, expected: &str, value: &Value) -> Self {
        Self {
            path: path.into(),
            message: format!("expected {}, got {}", expected, json_type_name(value)),
            kind: ErrorKind::TypeCoercion,
            value: Some(value.clone()),
        }
    }

    /// The value converts but violates a constraint.
    pub fn constraint(path: impl Into<String>, message: impl Into<String>, value: &Value) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind: ErrorKind::ConstraintViolation,
            value: Some(value.clone()),
        }
    }

    /// A user hook rejected the value.
    pub fn custom(path: impl Into<String>, message: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind: ErrorKind::CustomValidator,
            value,
        }
    }

    /// An unknown input key under strict extra-field handling.
    pub fn extra_forbidden(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: "unknown field".into(),
            kind: ErrorKind::ExtraForbidden,
            value: None,
        }
    }

    /// Malformed raw JSON text.
    pub fn parse(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: format!("invalid JSON: {}", reason.into()),
            kind: ErrorKind::Parse,
            value: None,
        }
    }

    /// No union alternative accepted the value.
    pub fn union_mismatch(path: impl Into<String>, reasons: &[String], value: &Value) -> Self {
        Self {
            path: path.into(),
            message: format!("no union alternative matched: {}", reasons.join("; ")),
            kind: ErrorKind::UnionMismatch,
            value: Some(value.clone()),
        }
    }

    /// Nested-model depth exceeded the configured maximum.
    pub fn recursion_limit(path: impl Into<String>, max_depth: usize) -> Self {
        Self {
            path: path.into(),
            message: format!("nesting exceeds maximum depth {}", max_depth),
            kind: ErrorKind::RecursionLimit,
            value: None,
        }
    }

    /// Returns a `{path, message, kind}` record.
    pub fn to_value(&self) -> Value {
        json!({
            "path": self.path,
            "message": self.message,
            "kind": self.kind.code(),
        })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "$root" } else { &self.path };
        write!(f, "{}: {} [{}]", path, self.message, self.kind.code())
    }
}

/// The aggregate failure raised to callers: every failing field from one
/// validation call, never only the first.
#[derive(Debug, Clone)]
pub struct ValidationFailure {
    subject: String,
    errors: Vec<ValidationError>,
}

impl ValidationFailure {
    /// Builds a failure for the given model or handler name.
    pub fn new(subject: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        Self {
            subject: subject.into(),
            errors,
        }
    }

    /// Builds a failure from a single error.
    pub fn single(subject: impl Into<String>, error: ValidationError) -> Self {
        Self::new(subject, vec![error])
    }

    /// The model or handler the call was validating.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Every accumulated error, in field order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Number of accumulated errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the errors as a JSON array of `{path, message, kind}` records.
    pub fn to_value(&self) -> Value {
        Value::Array(self.errors.iter().map(ValidationError::to_value).collect())
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "validation of '{}' failed with {} error(s):",
            self.subject,
            self.errors.len()
        )?;
        for err in &self.errors {
            writeln!(f, "  {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "float"
            }
        }
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
