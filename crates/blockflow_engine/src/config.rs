//! Engine configuration.

use std::time::Duration;

use blockflow_debug::TracerConfig;

/// How process errors are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Contain errors in the failing process: flag it, mark the element,
    /// and let the scheduler carry on.
    #[default]
    CatchErrors,
    /// Halt the failing process and return the error from
    /// `ThreadManager::step`, for tool developers.
    Debug,
}

/// Configuration for a `ThreadManager`.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Longest time one process may run before it is forced to yield.
    pub timeout: Duration,
    /// Error policy.
    pub execution_mode: ExecutionMode,
    /// Collect the heap every this many ticks (0 disables tick collections).
    pub collect_every: u64,
    /// Collect inside a step once this many objects were allocated since the
    /// last collection.
    pub collect_threshold: usize,
    /// Seed for `pick random`.
    pub seed: u64,
    /// Tracer settings.
    pub tracer: TracerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(500),
            execution_mode: ExecutionMode::CatchErrors,
            collect_every: 1,
            collect_threshold: 100_000,
            seed: 0,
            tracer: TracerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the per-process time slice.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder method to let errors escape `step`.
    #[must_use]
    pub fn debug(mut self) -> Self {
        self.execution_mode = ExecutionMode::Debug;
        self
    }

    /// Builder method to set the tick collection period.
    #[must_use]
    pub fn with_collect_every(mut self, ticks: u64) -> Self {
        self.collect_every = ticks;
        self
    }

    /// Builder method to set the in-step collection threshold.
    #[must_use]
    pub fn with_collect_threshold(mut self, allocations: usize) -> Self {
        self.collect_threshold = allocations;
        self
    }

    /// Builder method to seed the random number generator.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to configure tracing.
    #[must_use]
    pub fn with_tracer(mut self, tracer: TracerConfig) -> Self {
        self.tracer = tracer;
        self
    }

    /// The time slice in whole milliseconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}
