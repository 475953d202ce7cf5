//! CLI subsystem.
//!
//! Argument parsing, command dispatch, and surface errors. `main.rs`
//! delegates here and only maps the result to an exit code.

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::run;
pub use errors::{CliError, CliResult};
