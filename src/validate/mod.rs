//! Validation subsystem.
//!
//! # Design principles
//!
//! - Validators never mutate their input; they return coerced values
//! - Structural validation never halts at the first failing field
//! - One arena per top-level call, bulk-freed at return
//! - The compiled fast path and the interpreter are behaviorally
//!   interchangeable for every feature both represent
//! - No blocking I/O anywhere on the validation path

pub(crate) mod context;
mod engine;
mod errors;
pub(crate) mod interp;
pub(crate) mod validator;

pub use context::{install_host_hooks, HostGuard, HostHooks, ValidationContext};
pub use engine::Engine;
pub use errors::{json_type_name, ErrorKind, ValidationError, ValidationFailure};
pub use validator::Validator;
