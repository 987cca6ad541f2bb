//! Core values, identifiers, and persistent lists for Blockflow.
//!
//! This crate provides:
//! - [`Value`] - The runtime value every block reports
//! - [`ContextId`] / [`FrameId`] - Generational arena indices
//! - [`ProcessId`] - Scheduler-assigned process identifiers
//! - [`Type`] - Coarse runtime type tags used in error reporting
//! - [`Error`] - Rich error types with context
//! - [`ListVec`] - Persistent list with structural sharing

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod error;
pub mod ids;
pub mod types;
pub mod value;

pub use collections::ListVec;
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use ids::{ContextId, FrameId, ProcessId};
pub use types::Type;
pub use value::Value;
