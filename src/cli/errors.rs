//! CLI surface errors.

use thiserror::Error;

use crate::config::ConfigError;
use crate::decl::CompileError;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be read
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Declaration compilation failed
    #[error("{0}")]
    Compile(#[from] CompileError),

    /// Engine configuration failed to load
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Document validation failed; details were already reported
    #[error("validation of '{model}' failed with {count} error(s)")]
    ValidationFailed { model: String, count: usize },
}

impl CliError {
    /// Wraps an I/O error with its path.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
