//! Structured tracing for the Blockflow scheduler.
//!
//! This crate provides:
//! - [`Tracer`] - Records scheduler events with one branch of overhead when off
//! - [`TraceBuffer`] - Bounded ring of recent [`TraceRecord`]s
//! - [`HumanFormatter`] / [`JsonFormatter`] - Renderers for records

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod trace;

pub use trace::{
    HumanFormatter, JsonFormatter, TraceBuffer, TraceBufferStats, TraceEvent, TraceFormatter,
    TraceOutput, TraceRecord, Tracer, TracerConfig,
};
