//! Block expression trees, primitive selectors, and custom block definitions.
//!
//! This crate provides:
//! - [`Expression`] - The tagged union every script is made of
//! - [`Primitive`] - The closed set of engine-implemented selectors
//! - [`CustomBlockDefinition`] - User-defined blocks with upvar parameters
//! - [`builder`] - Constructors for writing scripts in code

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod builder;
pub mod definition;
pub mod expression;
pub mod primitive;

pub use definition::{BlockKind, CustomBlockDefinition, ParamKind, Parameter};
pub use expression::{BlockCall, Callee, Expr, Expression, PseudoOp, Slot, SlotContents};
pub use primitive::Primitive;
