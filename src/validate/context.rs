//! Per-call validation context.
//!
//! One context lives for exactly one top-level validation call and
//! everything it recursively triggers. It carries the call's bump arena
//! (intermediate path strings and uniqueness keys are allocated there and
//! bulk-freed when the arena drops), the accumulating error list, and the
//! recursion-depth counter. A context is never shared across threads or
//! across concurrent calls.

use bumpalo::Bump;
use std::sync::OnceLock;

use super::errors::ValidationError;

/// Suspend/resume callbacks into a host runtime's collector.
///
/// An embedder whose host language has a stop-the-world collector installs
/// these once at startup; validation then pauses collection for the
/// duration of every callback into host-managed code. Without installed
/// hooks the guard is a no-op, which is the correct behavior under an
/// ownership-based runtime with no tracing collector.
#[derive(Debug, Clone, Copy)]
pub struct HostHooks {
    /// Called before control crosses into host-managed code
    pub suspend: fn(),
    /// Called after control returns
    pub resume: fn(),
}

static HOST_HOOKS: OnceLock<HostHooks> = OnceLock::new();

/// Installs host collector hooks. First installation wins; later calls
/// return false and change nothing.
pub fn install_host_hooks(hooks: HostHooks) -> bool {
    HOST_HOOKS.set(hooks).is_ok()
}

/// Scoped collector pause around a host callback.
///
/// Suspends on construction, resumes on drop. A no-op unless an embedder
/// installed [`HostHooks`].
pub struct HostGuard {
    active: bool,
}

impl HostGuard {
    /// Pauses the host collector for the guard's lifetime.
    pub fn pause() -> Self {
        match HOST_HOOKS.get() {
            Some(hooks) => {
                (hooks.suspend)();
                Self { active: true }
            }
            None => Self { active: false },
        }
    }
}

impl Drop for HostGuard {
    fn drop(&mut self) {
        if self.active {
            if let Some(hooks) = HOST_HOOKS.get() {
                (hooks.resume)();
            }
        }
    }
}

/// Mutable state for one top-level validation call.
pub struct ValidationContext<'a> {
    arena: &'a Bump,
    errors: Vec<ValidationError>,
    depth: usize,
    max_depth: usize,
    /// Effective coercion mode for the model currently being validated
    pub(crate) strict: bool,
    /// Engine-wide default coercion mode, the fallback for models without
    /// a `strict_types` override
    pub(crate) engine_strict: bool,
    /// True when the call runs on the interpreted path
    pub(crate) interpreted: bool,
}

impl<'a> ValidationContext<'a> {
    /// Creates a context for one top-level call.
    pub fn new(arena: &'a Bump, max_depth: usize, strict: bool, interpreted: bool) -> Self {
        Self {
            arena,
            errors: Vec::new(),
            depth: 0,
            max_depth,
            strict,
            engine_strict: strict,
            interpreted,
        }
    }

    /// The call's arena.
    pub fn arena(&self) -> &'a Bump {
        self.arena
    }

    /// Records an error.
    pub fn push_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Number of errors recorded so far.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Discards errors recorded past `mark`, returning their messages.
    ///
    /// Union validation tries alternatives against the live context and
    /// rolls back the ones that fail.
    pub fn rollback_to(&mut self, mark: usize) -> Vec<String> {
        self.errors.drain(mark..).map(|e| e.message).collect()
    }

    /// Consumes the context's accumulated errors.
    pub fn take_errors(&mut self) -> Vec<ValidationError> {
        std::mem::take(&mut self.errors)
    }

    /// Enters one level of nested-model validation. Returns false and
    /// records a recursion-limit error when the maximum is exceeded.
    pub fn descend(&mut self, path: &str) -> bool {
        if self.depth >= self.max_depth {
            self.push_error(ValidationError::recursion_limit(path, self.max_depth));
            return false;
        }
        self.depth += 1;
        true
    }

    /// Leaves one level of nested-model validation.
    pub fn ascend(&mut self) {
        debug_assert!(self.depth > 0);
        self.depth = self.depth.saturating_sub(1);
    }

    /// Joins a field name onto a path prefix, arena-allocated.
    pub fn child_path(&self, prefix: &str, name: &str) -> &'a str {
        if prefix.is_empty() {
            self.arena.alloc_str(name)
        } else {
            bumpalo::format!(in self.arena, "{}.{}", prefix, name).into_bump_str()
        }
    }

    /// Joins a list index onto a path prefix, arena-allocated.
    pub fn index_path(&self, prefix: &str, index: usize) -> &'a str {
        if prefix.is_empty() {
            bumpalo::format!(in self.arena, "{}", index).into_bump_str()
        } else {
            bumpalo::format!(in self.arena, "{}.{}", prefix, index).into_bump_str()
        }
    }
}
