//! Cooperative interpreter and scheduler for Blockflow scripts.
//!
//! This crate provides:
//! - [`ThreadManager`] - Time-slices processes, registers launched ones, sweeps finished ones
//! - [`Process`] - One running script over a chain of [`Context`]s
//! - [`Heap`] - Context and frame arenas with a mark-and-sweep collector
//! - [`VariableFrame`] / [`UpvarReference`] - Variable scopes and aliases
//! - [`Receiver`] / [`Host`] / [`BlockView`] - Interfaces to sprites, stage, and editor
//! - [`EngineConfig`] / [`Clock`] - Configuration and time source

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod config;
pub mod context;
pub mod frame;
pub mod heap;
pub mod host;
mod process;
pub mod thread_manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, ExecutionMode};
pub use context::{Context, Scope, TailPosition};
pub use frame::{Binding, UpvarReference, VariableFrame};
pub use heap::{CollectStats, Heap};
pub use host::{BlockView, Host, Receiver, ReceiverRef, TopBlock};
pub use process::{Process, ProcessHandle};
pub use thread_manager::ThreadManager;
