//! Runtime type tags.

use std::fmt;

/// Coarse type of a [`crate::Value`], used when an operand has the wrong shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// The empty value.
    Nil,
    /// Boolean.
    Bool,
    /// Any number (integer or float).
    Number,
    /// Text.
    String,
    /// Persistent list.
    List,
    /// Reified script or continuation.
    Closure,
    /// Accepts anything.
    Any,
}

impl Type {
    /// Returns true if a value of type `other` satisfies this type.
    #[must_use]
    pub fn accepts(self, other: Type) -> bool {
        self == Type::Any || self == other
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nil => "nothing",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::String => "text",
            Self::List => "list",
            Self::Closure => "script",
            Self::Any => "any",
        };
        f.write_str(name)
    }
}
