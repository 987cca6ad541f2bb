//! User-defined ("custom") block definitions.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::expression::Expr;

/// Shape of a block: what it leaves behind when evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Runs for effect.
    Command,
    /// Reports a value.
    Reporter,
    /// Reports a boolean.
    Predicate,
}

impl BlockKind {
    /// True for blocks that do not report.
    #[must_use]
    pub const fn is_command(self) -> bool {
        matches!(self, Self::Command)
    }
}

/// How a formal parameter receives its argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// By value, bound in the callee's own scope.
    Normal,
    /// By reference: the argument names a caller variable the parameter aliases.
    Upvar,
}

/// A formal parameter of a custom block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    /// Name the body refers to.
    pub name: Arc<str>,
    /// Binding mode.
    pub kind: ParamKind,
}

impl Parameter {
    /// A by-value parameter.
    #[must_use]
    pub fn normal(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            kind: ParamKind::Normal,
        }
    }

    /// A by-reference parameter.
    #[must_use]
    pub fn upvar(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            kind: ParamKind::Upvar,
        }
    }
}

/// A user-defined block.
///
/// The body can be attached after construction so that a definition may call
/// itself recursively.
pub struct CustomBlockDefinition {
    /// Label shown on the block, such as `incr %var`.
    pub spec: String,
    /// Command, reporter, or predicate.
    pub kind: BlockKind,
    /// Formal parameters in slot order.
    pub parameters: Vec<Parameter>,
    body: OnceLock<Expr>,
}

impl CustomBlockDefinition {
    /// Creates a definition without a body.
    #[must_use]
    pub fn new(spec: impl Into<String>, kind: BlockKind, parameters: Vec<Parameter>) -> Self {
        Self {
            spec: spec.into(),
            kind,
            parameters,
            body: OnceLock::new(),
        }
    }

    /// Builder method to attach the body.
    #[must_use]
    pub fn with_body(self, body: Expr) -> Self {
        let _ = self.body.set(body);
        self
    }

    /// Attaches the body once. Returns false if a body was already set.
    pub fn set_body(&self, body: Expr) -> bool {
        self.body.set(body).is_ok()
    }

    /// The body script, if one has been attached.
    #[must_use]
    pub fn body(&self) -> Option<&Expr> {
        self.body.get()
    }

    /// Parameter names in slot order.
    #[must_use]
    pub fn parameter_names(&self) -> Vec<Arc<str>> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    /// True if any parameter is passed by reference.
    #[must_use]
    pub fn has_upvars(&self) -> bool {
        self.parameters.iter().any(|p| p.kind == ParamKind::Upvar)
    }
}

impl fmt::Debug for CustomBlockDefinition {
    // The body may refer back to this definition, so it is not printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomBlockDefinition")
            .field("spec", &self.spec)
            .field("kind", &self.kind)
            .field("parameters", &self.parameters)
            .field("has_body", &self.body.get().is_some())
            .finish()
    }
}
