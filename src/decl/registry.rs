//! The model spec registry.
//!
//! Declarations are registered (or loaded from a directory of JSON files,
//! one per model), compiled immediately, and kept for the process
//! lifetime. Forward and self references are legal at registration and
//! resolved by [`SpecRegistry::finalize`], which also validates every
//! declared default against its own field's rules. Registered names are
//! immutable: re-registering an existing name fails.
//!
//! After finalize the registry is effectively read-only; concurrent
//! validation calls share specs through `Arc` without contention beyond a
//! read lock on the name table.

use bumpalo::Bump;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use super::compiler::compile_model;
use super::errors::{CompileError, CompileResult};
use super::hooks::CustomParser;
use super::spec::ModelSpec;
use super::types::ModelDecl;
use crate::observability::{logger, Severity};
use crate::validate::context::ValidationContext;
use crate::validate::interp;

/// Default recursion budget used when validating declared defaults.
const FINALIZE_MAX_DEPTH: usize = 64;

/// Process-lifetime registry of compiled model specs and custom parsers.
#[derive(Debug, Default)]
pub struct SpecRegistry {
    specs: RwLock<HashMap<String, Arc<ModelSpec>>>,
    parsers: RwLock<HashMap<String, CustomParser>>,
    finalized: AtomicBool,
}

impl SpecRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers and compiles a declaration.
    ///
    /// References to models or parsers that are not registered yet are
    /// allowed; they are resolved at finalize.
    pub fn register(&self, decl: ModelDecl) -> CompileResult<()> {
        let spec = compile_model(&decl)?;
        let mut specs = self.specs.write().expect("spec registry poisoned");
        if specs.contains_key(&spec.name) {
            return Err(CompileError::immutable(&spec.name));
        }
        logger::emit(
            Severity::Info,
            "model_compiled",
            &[
                ("model", spec.name.as_str()),
                ("fast_path", if spec.is_fast_path_capable() { "true" } else { "false" }),
            ],
        );
        specs.insert(spec.name.clone(), Arc::new(spec));
        self.finalized.store(false, Ordering::Release);
        Ok(())
    }

    /// Registers a custom parser under its name.
    pub fn register_parser(&self, parser: CustomParser) -> CompileResult<()> {
        let mut parsers = self.parsers.write().expect("parser registry poisoned");
        if parsers.contains_key(parser.name()) {
            return Err(CompileError::immutable(parser.name()));
        }
        parsers.insert(parser.name().to_string(), parser);
        Ok(())
    }

    /// Resolves every model and parser reference and validates declared
    /// defaults. Must be called after all declarations are registered and
    /// before validation begins.
    pub fn finalize(&self) -> CompileResult<()> {
        // Snapshot the specs so no lock is held while defaults run through
        // the interpreter (which resolves references back through self).
        let specs: Vec<Arc<ModelSpec>> = {
            let guard = self.specs.read().expect("spec registry poisoned");
            guard.values().cloned().collect()
        };

        for spec in &specs {
            for decl in &spec.decls {
                let mut models = Vec::new();
                decl.ty.referenced_models(&mut models);
                for referenced in models {
                    if !self.contains(&referenced) {
                        return Err(CompileError::unknown_model(&spec.name, referenced));
                    }
                }

                let mut parsers = Vec::new();
                decl.ty.referenced_parsers(&mut parsers);
                for referenced in parsers {
                    if !self
                        .parsers
                        .read()
                        .expect("parser registry poisoned")
                        .contains_key(&referenced)
                    {
                        return Err(CompileError::unknown_parser(
                            &spec.name,
                            &decl.name,
                            referenced,
                        ));
                    }
                }
            }
        }

        // Defaults must satisfy their own field's rules. Run them through
        // the interpreter now that every reference resolves.
        for spec in &specs {
            for decl in &spec.decls {
                check_default(self, &spec.name, decl)?;
            }
        }

        self.finalized.store(true, Ordering::Release);
        let count = specs.len().to_string();
        logger::emit(Severity::Info, "registry_finalized", &[("models", count.as_str())]);
        Ok(())
    }

    /// True once finalize has succeeded with no registrations after it.
    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::Acquire)
    }

    /// Looks up a compiled spec by name.
    pub fn get(&self, name: &str) -> Option<Arc<ModelSpec>> {
        self.specs
            .read()
            .expect("spec registry poisoned")
            .get(name)
            .cloned()
    }

    /// True if a model with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.specs
            .read()
            .expect("spec registry poisoned")
            .contains_key(name)
    }

    /// Looks up a custom parser by name.
    pub fn parser(&self, name: &str) -> Option<CustomParser> {
        self.parsers
            .read()
            .expect("parser registry poisoned")
            .get(name)
            .cloned()
    }

    /// Registered model names, sorted.
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .specs
            .read()
            .expect("spec registry poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Number of registered models.
    pub fn model_count(&self) -> usize {
        self.specs.read().expect("spec registry poisoned").len()
    }

    /// Loads every `*.json` declaration file from a directory.
    ///
    /// Returns the number of models registered. Malformed files are
    /// definition-time fatal errors. Call [`finalize`] afterwards.
    ///
    /// [`finalize`]: SpecRegistry::finalize
    pub fn load_dir(&self, dir: &Path) -> CompileResult<usize> {
        let entries = fs::read_dir(dir).map_err(|e| {
            CompileError::malformed_file(dir.display().to_string(), e.to_string())
        })?;

        let mut loaded = 0;
        for entry in entries {
            let entry = entry.map_err(|e| {
                CompileError::malformed_file(dir.display().to_string(), e.to_string())
            })?;
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }

            let content = fs::read_to_string(&path).map_err(|e| {
                CompileError::malformed_file(path.display().to_string(), e.to_string())
            })?;
            let decl: ModelDecl = serde_json::from_str(&content).map_err(|e| {
                CompileError::malformed_file(path.display().to_string(), e.to_string())
            })?;
            self.register(decl)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Saves a registered model's declaration as `<name>.json` in `dir`.
    ///
    /// Hooks are process-local and not part of the file. Overwriting an
    /// existing file is refused, mirroring registration immutability.
    pub fn save_decl(&self, name: &str, dir: &Path) -> CompileResult<PathBuf> {
        let spec = self
            .get(name)
            .ok_or_else(|| CompileError::unknown_model(name, name))?;

        let decl = ModelDecl {
            name: spec.name.clone(),
            description: spec.description.clone(),
            fields: spec.decls.clone(),
            config: spec.config,
            field_hooks: HashMap::new(),
            root_hook: None,
        };

        let path = dir.join(format!("{}.json", spec.name));
        if path.exists() {
            return Err(CompileError::immutable(&spec.name));
        }
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                CompileError::malformed_file(dir.display().to_string(), e.to_string())
            })?;
        }

        let content = serde_json::to_string_pretty(&decl).map_err(|e| {
            CompileError::malformed_file(path.display().to_string(), e.to_string())
        })?;
        fs::write(&path, content).map_err(|e| {
            CompileError::malformed_file(path.display().to_string(), e.to_string())
        })?;
        Ok(path)
    }
}

/// Validates a declared default, used by finalize. Exposed for parameter
/// plans, which carry defaults of their own.
pub(crate) fn check_default(
    registry: &SpecRegistry,
    owner: &str,
    decl: &super::types::FieldDecl,
) -> CompileResult<()> {
    let Some(default) = &decl.default else {
        return Ok(());
    };
    if default.is_null() {
        if !matches!(decl.ty, super::types::TypeExpr::Optional { .. }) {
            return Err(CompileError::bad_default(
                owner,
                &decl.name,
                "null default on a non-optional type",
            ));
        }
        return Ok(());
    }
    let arena = Bump::new();
    let mut ctx = ValidationContext::new(&arena, FINALIZE_MAX_DEPTH, false, true);
    if interp::check_value(&decl.ty, &decl.constraints, default, &decl.name, &mut ctx, registry)
        .is_none()
    {
        let reason = ctx
            .take_errors()
            .into_iter()
            .next()
            .map(|e| e.message)
            .unwrap_or_else(|| "rejected".to_string());
        return Err(CompileError::bad_default(owner, &decl.name, reason));
    }
    Ok(())
}
