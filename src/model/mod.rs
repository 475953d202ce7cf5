//! Model runtime subsystem.
//!
//! Instance construction, field access, mapping/JSON import-export, and
//! structural schema export over compiled specs.

mod instance;
mod runtime;
mod schema_export;

pub use instance::ModelInstance;
pub use runtime::ModelType;
pub use schema_export::{type_label, FieldSchema, ModelSchema};
