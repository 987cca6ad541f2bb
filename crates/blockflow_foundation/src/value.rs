//! The runtime value every block reports.

use std::fmt;
use std::sync::Arc;

use crate::collections::ListVec;
use crate::error::{Error, Result};
use crate::ids::ContextId;
use crate::types::Type;

/// Runtime value flowing between blocks.
///
/// Values are immutable and cheaply cloneable. Lists share structure, and a
/// closure is only a handle into the engine heap.
#[derive(Clone)]
pub enum Value {
    /// What an empty slot reports; prints as nothing, counts as zero.
    Nil,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// Text.
    String(Arc<str>),
    /// Persistent list.
    List(ListVec<Value>),
    /// Reified script, reporter, or captured continuation.
    Closure(ContextId),
}

impl Value {
    /// Returns the coarse type of this value.
    #[must_use]
    pub fn value_type(&self) -> Type {
        match self {
            Self::Nil => Type::Nil,
            Self::Bool(_) => Type::Bool,
            Self::Int(_) | Self::Float(_) => Type::Number,
            Self::String(_) => Type::String,
            Self::List(_) => Type::List,
            Self::Closure(_) => Type::Closure,
        }
    }

    /// Returns true if this value counts as a true condition.
    ///
    /// Only nil, `false` and the empty text are false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil | Self::Bool(false) => false,
            Self::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a closure handle.
    #[must_use]
    pub const fn as_closure(&self) -> Option<ContextId> {
        match self {
            Self::Closure(id) => Some(*id),
            _ => None,
        }
    }

    /// Coerces this value to a number (`Int` or `Float`).
    ///
    /// Nil and blank text count as `0`; numeric text is parsed.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if the value has no numeric reading.
    pub fn to_number(&self) -> Result<Value> {
        match self {
            Self::Int(_) | Self::Float(_) => Ok(self.clone()),
            Self::Nil => Ok(Self::Int(0)),
            Self::String(s) => Self::parse_number(s)
                .ok_or_else(|| Error::type_mismatch(Type::Number, Type::String)),
            other => Err(Error::type_mismatch(Type::Number, other.value_type())),
        }
    }

    /// Coerces this value to `f64`.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if the value has no numeric reading.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(&self) -> Result<f64> {
        match self.to_number()? {
            Self::Int(n) => Ok(n as f64),
            Self::Float(f) => Ok(f),
            _ => Err(Error::internal("number coercion produced a non-number")),
        }
    }

    /// Returns the numeric reading of this value, if it has one.
    #[must_use]
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Self::Bool(_) | Self::List(_) | Self::Closure(_) => None,
            Self::String(s) if s.trim().is_empty() => None,
            _ => self.to_f64().ok(),
        }
    }

    fn parse_number(text: &str) -> Option<Value> {
        let text = text.trim();
        if text.is_empty() {
            return Some(Self::Int(0));
        }
        if let Ok(n) = text.parse::<i64>() {
            return Some(Self::Int(n));
        }
        text.parse::<f64>().ok().map(Self::Float)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Closure(a), Self::Closure(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n:?}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(items) => write!(f, "{items:?}"),
            Self::Closure(id) => write!(f, "Closure({id:?})"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) if n.is_nan() => write!(f, "NaN"),
            Self::Float(n) if n.is_infinite() => {
                write!(f, "{}Infinity", if *n < 0.0 { "-" } else { "" })
            }
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Closure(_) => write!(f, "<script>"),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Nil
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Self::String(s)
    }
}

impl From<ContextId> for Value {
    fn from(id: ContextId) -> Self {
        Self::Closure(id)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}
