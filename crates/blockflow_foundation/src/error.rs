//! Error types for the Blockflow engine.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::types::Type;

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Blockflow operations.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an arity error for a reified script called with the wrong
    /// number of inputs.
    #[must_use]
    pub fn arity_mismatch(expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch { expected, actual })
    }

    /// Creates an unbound variable error.
    #[must_use]
    pub fn unbound_variable(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnboundVariable(name.into()))
    }

    /// Creates a primitive failure raised by a receiver or the host.
    #[must_use]
    pub fn primitive(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Primitive {
            selector: selector.into(),
            message: message.into(),
        })
    }

    /// Creates the error raised when a selector is not understood.
    #[must_use]
    pub fn unknown_selector(selector: impl Into<String>) -> Self {
        Self::primitive(selector, "no such block")
    }

    /// Creates the error raised when a continuation is forked.
    #[must_use]
    pub fn continuation_fork() -> Self {
        Self::new(ErrorKind::ContinuationFork)
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: Type, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates a stale reference error.
    #[must_use]
    pub fn stale_reference(what: impl fmt::Display) -> Self {
        Self::new(ErrorKind::StaleReference(what.to_string()))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, Error)]
pub enum ErrorKind {
    /// A reified script was invoked with the wrong number of inputs.
    #[error("expecting {expected} input(s), but getting {actual}")]
    ArityMismatch {
        /// Number of empty slots the script exposes.
        expected: usize,
        /// Number of inputs supplied.
        actual: usize,
    },

    /// Variable lookup exhausted both the lexical and the dynamic chain.
    #[error("a variable of name '{0}' does not exist in this context")]
    UnboundVariable(String),

    /// A receiver or host primitive failed.
    #[error("{selector}: {message}")]
    Primitive {
        /// The selector that failed.
        selector: String,
        /// What went wrong.
        message: String,
    },

    /// A captured continuation was passed to `fork`.
    #[error("continuations cannot be forked")]
    ContinuationFork,

    /// An operand had the wrong type.
    #[error("expecting {expected} but getting {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: Type,
        /// The actual type encountered.
        actual: Type,
    },

    /// An arena handle outlived the object it referred to.
    #[error("stale reference: {0}")]
    StaleReference(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Selector of the block that was executing.
    pub element: Option<String>,
    /// Label of the top block the process was started from.
    pub script: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the failing element.
    #[must_use]
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Sets the script label.
    #[must_use]
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(element) = &self.element {
            write!(f, "in {element}")?;
        }
        if let Some(script) = &self.script {
            write!(f, " ({script})")?;
        }
        Ok(())
    }
}
