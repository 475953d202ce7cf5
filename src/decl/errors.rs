//! Compile-surface error types.
//!
//! Error codes:
//! - MODEL_COMPILE_UNSUPPORTED_TYPE
//! - MODEL_COMPILE_CONSTRAINT_CONFLICT
//! - MODEL_COMPILE_BAD_PATTERN
//! - MODEL_COMPILE_BAD_DEFAULT
//! - MODEL_COMPILE_DUPLICATE_FIELD
//! - MODEL_COMPILE_UNKNOWN_MODEL
//! - MODEL_COMPILE_IMMUTABLE
//! - MODEL_COMPILE_MALFORMED_FILE
//! - MODEL_COMPILE_BAD_PARAM
//!
//! Every compile error is fatal for the affected declaration and is raised
//! at definition time, never while a document is being validated.

use std::fmt;

/// Compile error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorCode {
    /// A type annotation the compiler does not support
    UnsupportedType,
    /// An internally contradictory or inapplicable constraint set
    ConstraintConflict,
    /// A string pattern that fails to compile
    BadPattern,
    /// A declared default that violates its own field's rules
    BadDefault,
    /// Two fields with the same name in one model
    DuplicateField,
    /// A reference to a model or custom parser that does not exist
    UnknownModel,
    /// Attempt to re-register an existing model name
    Immutable,
    /// A declaration file that cannot be read or parsed
    MalformedFile,
    /// An invalid handler parameter declaration
    BadParam,
}

impl CompileErrorCode {
    /// Returns the stable string code.
    pub fn code(&self) -> &'static str {
        match self {
            CompileErrorCode::UnsupportedType => "MODEL_COMPILE_UNSUPPORTED_TYPE",
            CompileErrorCode::ConstraintConflict => "MODEL_COMPILE_CONSTRAINT_CONFLICT",
            CompileErrorCode::BadPattern => "MODEL_COMPILE_BAD_PATTERN",
            CompileErrorCode::BadDefault => "MODEL_COMPILE_BAD_DEFAULT",
            CompileErrorCode::DuplicateField => "MODEL_COMPILE_DUPLICATE_FIELD",
            CompileErrorCode::UnknownModel => "MODEL_COMPILE_UNKNOWN_MODEL",
            CompileErrorCode::Immutable => "MODEL_COMPILE_IMMUTABLE",
            CompileErrorCode::MalformedFile => "MODEL_COMPILE_MALFORMED_FILE",
            CompileErrorCode::BadParam => "MODEL_COMPILE_BAD_PARAM",
        }
    }
}

impl fmt::Display for CompileErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Compile error with full context.
#[derive(Debug, Clone)]
pub struct CompileError {
    code: CompileErrorCode,
    message: String,
    model: Option<String>,
    field: Option<String>,
}

impl CompileError {
    /// Create an unsupported type error.
    pub fn unsupported_type(
        model: impl Into<String>,
        field: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        let field = field.into();
        Self {
            code: CompileErrorCode::UnsupportedType,
            message: format!("field '{}': {}", field, detail.into()),
            model: Some(model.into()),
            field: Some(field),
        }
    }

    /// Create a constraint conflict error.
    pub fn constraint_conflict(
        model: impl Into<String>,
        field: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        let field = field.into();
        Self {
            code: CompileErrorCode::ConstraintConflict,
            message: format!("field '{}': {}", field, detail.into()),
            model: Some(model.into()),
            field: Some(field),
        }
    }

    /// Create a bad pattern error.
    pub fn bad_pattern(
        model: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let field = field.into();
        Self {
            code: CompileErrorCode::BadPattern,
            message: format!("field '{}': invalid pattern: {}", field, reason.into()),
            model: Some(model.into()),
            field: Some(field),
        }
    }

    /// Create a bad default error.
    pub fn bad_default(
        model: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let field = field.into();
        Self {
            code: CompileErrorCode::BadDefault,
            message: format!(
                "field '{}': default violates field rules: {}",
                field,
                reason.into()
            ),
            model: Some(model.into()),
            field: Some(field),
        }
    }

    /// Create a duplicate field error.
    pub fn duplicate_field(model: impl Into<String>, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            code: CompileErrorCode::DuplicateField,
            message: format!("duplicate field name '{}'", field),
            model: Some(model.into()),
            field: Some(field),
        }
    }

    /// Create an unknown model reference error.
    pub fn unknown_model(model: impl Into<String>, referenced: impl Into<String>) -> Self {
        Self {
            code: CompileErrorCode::UnknownModel,
            message: format!("reference to unknown model '{}'", referenced.into()),
            model: Some(model.into()),
            field: None,
        }
    }

    /// Create an unknown custom parser error.
    pub fn unknown_parser(
        model: impl Into<String>,
        field: impl Into<String>,
        parser: impl Into<String>,
    ) -> Self {
        let field = field.into();
        Self {
            code: CompileErrorCode::UnknownModel,
            message: format!(
                "field '{}': reference to unregistered parser '{}'",
                field,
                parser.into()
            ),
            model: Some(model.into()),
            field: Some(field),
        }
    }

    /// Create an immutable registration error.
    pub fn immutable(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            code: CompileErrorCode::Immutable,
            message: format!("model '{}' is already registered", model),
            model: Some(model),
            field: None,
        }
    }

    /// Create a malformed declaration file error.
    pub fn malformed_file(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: CompileErrorCode::MalformedFile,
            message: format!(
                "malformed declaration file '{}': {}",
                path.into(),
                reason.into()
            ),
            model: None,
            field: None,
        }
    }

    /// Create an invalid handler parameter error.
    pub fn bad_param(
        handler: impl Into<String>,
        param: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let param = param.into();
        Self {
            code: CompileErrorCode::BadParam,
            message: format!("parameter '{}': {}", param, reason.into()),
            model: Some(handler.into()),
            field: Some(param),
        }
    }

    /// Returns the error code.
    pub fn code(&self) -> CompileErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the model (or handler) name if applicable.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Returns the field (or parameter) name if applicable.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: ", self.code.code())?;
        if let Some(model) = &self.model {
            write!(f, "model '{}': ", model)?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CompileError {}

/// Result type for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            CompileErrorCode::UnsupportedType.code(),
            "MODEL_COMPILE_UNSUPPORTED_TYPE"
        );
        assert_eq!(
            CompileErrorCode::ConstraintConflict.code(),
            "MODEL_COMPILE_CONSTRAINT_CONFLICT"
        );
        assert_eq!(CompileErrorCode::Immutable.code(), "MODEL_COMPILE_IMMUTABLE");
        assert_eq!(CompileErrorCode::BadParam.code(), "MODEL_COMPILE_BAD_PARAM");
    }

    #[test]
    fn test_display_includes_model_and_code() {
        let err = CompileError::constraint_conflict("user", "age", "ge 10 greater than le 5");
        let display = format!("{}", err);
        assert!(display.contains("MODEL_COMPILE_CONSTRAINT_CONFLICT"));
        assert!(display.contains("user"));
        assert!(display.contains("age"));
        assert!(display.contains("FATAL"));
    }

    #[test]
    fn test_duplicate_field_carries_context() {
        let err = CompileError::duplicate_field("order", "qty");
        assert_eq!(err.code(), CompileErrorCode::DuplicateField);
        assert_eq!(err.model(), Some("order"));
        assert_eq!(err.field(), Some("qty"));
    }
}
