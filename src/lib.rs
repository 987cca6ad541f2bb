//! Blockflow - Cooperative interpreter for visual block scripts
//!
//! This crate re-exports all layers of the Blockflow system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: blockflow_engine     — Heap, processes, primitives, scheduler
//! Layer 1: blockflow_language   — Expression trees, primitives, custom blocks
//!          blockflow_debug      — Structured tracing
//! Layer 0: blockflow_foundation — Core types (Value, ContextId, Error)
//! ```

pub use blockflow_debug as debug;
pub use blockflow_engine as engine;
pub use blockflow_foundation as foundation;
pub use blockflow_language as language;
