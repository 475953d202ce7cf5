//! User-supplied validation callbacks.
//!
//! Hooks are process-local: they attach to a declaration through the
//! builder and are never serialized with it. A field hook runs after the
//! field's built-in checks pass and sees every field validated so far; a
//! root hook runs once after all fields pass; a custom parser replaces the
//! built-in type check entirely and forces the interpreted path.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Fields validated so far, in declaration order.
pub type FieldsSoFar = Map<String, Value>;

type FieldHookFn =
    dyn Fn(&Value, &FieldsSoFar) -> Result<Option<Value>, String> + Send + Sync;
type RootHookFn =
    dyn Fn(&FieldsSoFar) -> Result<Option<FieldsSoFar>, String> + Send + Sync;
type ParserFn = dyn Fn(&Value) -> Result<Value, String> + Send + Sync;

/// A per-field hook: may reject with a message or replace the coerced value.
#[derive(Clone)]
pub struct FieldHook {
    func: Arc<FieldHookFn>,
}

impl FieldHook {
    /// Wraps a callback. `Ok(None)` keeps the coerced value, `Ok(Some(v))`
    /// replaces it, `Err(msg)` rejects the field.
    pub fn new(
        func: impl Fn(&Value, &FieldsSoFar) -> Result<Option<Value>, String>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            func: Arc::new(func),
        }
    }

    pub(crate) fn call(
        &self,
        value: &Value,
        so_far: &FieldsSoFar,
    ) -> Result<Option<Value>, String> {
        (self.func)(value, so_far)
    }
}

impl fmt::Debug for FieldHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldHook(..)")
    }
}

/// A whole-model hook: may reject or transform the assembled mapping.
#[derive(Clone)]
pub struct RootHook {
    func: Arc<RootHookFn>,
}

impl RootHook {
    /// Wraps a callback. `Ok(None)` keeps the mapping, `Ok(Some(m))`
    /// replaces it, `Err(msg)` rejects the whole instance.
    pub fn new(
        func: impl Fn(&FieldsSoFar) -> Result<Option<FieldsSoFar>, String>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            func: Arc::new(func),
        }
    }

    pub(crate) fn call(&self, fields: &FieldsSoFar) -> Result<Option<FieldsSoFar>, String> {
        (self.func)(fields)
    }
}

impl fmt::Debug for RootHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootHook(..)")
    }
}

/// A registered custom type parser, referenced by `TypeExpr::Custom`.
///
/// The parser receives the raw value and returns the coerced value or a
/// rejection message. Models using one are never fast-path compiled.
#[derive(Clone)]
pub struct CustomParser {
    name: String,
    func: Arc<ParserFn>,
}

impl CustomParser {
    /// Wraps a parser callback under the given name.
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Returns the registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call(&self, value: &Value) -> Result<Value, String> {
        (self.func)(value)
    }
}

impl fmt::Debug for CustomParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomParser({})", self.name)
    }
}
