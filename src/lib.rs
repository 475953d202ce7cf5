//! aeromodel - A strict, deterministic model validation engine
//!
//! Declarative model definitions compile once into immutable specs,
//! executed by a compiled fast path or a behaviorally identical
//! interpreted fallback.

pub mod cli;
pub mod config;
pub mod decl;
pub mod extract;
pub mod model;
pub mod observability;
pub mod validate;
