//! Trace event and record types.
//!
//! This module defines the events the scheduler and its processes emit.

use blockflow_foundation::{ProcessId, Value};

// =============================================================================
// Trace Event
// =============================================================================

/// Events that can be traced while the scheduler runs.
#[derive(Clone, Debug)]
pub enum TraceEvent {
    /// A scheduler tick has started.
    TickStart {
        /// The tick number.
        tick: u64,
    },

    /// A scheduler tick has ended.
    TickEnd {
        /// The tick number.
        tick: u64,
        /// Processes still registered after the sweep.
        processes: usize,
    },

    /// A process was created for a script.
    ProcessStarted {
        /// The new process.
        process: ProcessId,
        /// Label of the script it runs.
        script: String,
    },

    /// A process gave control back before finishing.
    ProcessYielded {
        /// The process.
        process: ProcessId,
        /// Contexts evaluated during the slice.
        evaluations: u64,
    },

    /// A stop was requested for a process.
    ProcessStopped {
        /// The process.
        process: ProcessId,
    },

    /// A finished process was swept.
    ProcessFinished {
        /// The process.
        process: ProcessId,
        /// Value a reporter script produced, if any.
        result: Option<Value>,
    },

    /// A process raised an error and was halted.
    ProcessError {
        /// The process.
        process: ProcessId,
        /// Selector of the failing element.
        element: String,
        /// The error message.
        message: String,
    },

    /// A message was broadcast.
    Broadcast {
        /// The sending process.
        process: ProcessId,
        /// The message.
        message: String,
        /// Number of scripts started by it.
        receivers: usize,
    },

    /// A process launched another one.
    Forked {
        /// The launching process.
        parent: ProcessId,
        /// The new process.
        child: ProcessId,
    },

    /// A process resumed a captured continuation.
    ContinuationInvoked {
        /// The process.
        process: ProcessId,
    },

    /// The heap was collected.
    Collection {
        /// Contexts reclaimed.
        contexts_freed: usize,
        /// Frames reclaimed.
        frames_freed: usize,
        /// Contexts still alive.
        live_contexts: usize,
    },

    /// Custom host event.
    Custom {
        /// Event name.
        name: String,
        /// Event data.
        data: Value,
    },
}

impl TraceEvent {
    /// Returns a short name for the event type.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TickStart { .. } => "tick-start",
            Self::TickEnd { .. } => "tick-end",
            Self::ProcessStarted { .. } => "process-started",
            Self::ProcessYielded { .. } => "process-yielded",
            Self::ProcessStopped { .. } => "process-stopped",
            Self::ProcessFinished { .. } => "process-finished",
            Self::ProcessError { .. } => "process-error",
            Self::Broadcast { .. } => "broadcast",
            Self::Forked { .. } => "forked",
            Self::ContinuationInvoked { .. } => "continuation-invoked",
            Self::Collection { .. } => "collection",
            Self::Custom { .. } => "custom",
        }
    }

    /// Returns true if this is a tick boundary event.
    #[must_use]
    pub fn is_tick_boundary(&self) -> bool {
        matches!(self, Self::TickStart { .. } | Self::TickEnd { .. })
    }

    /// The process this event concerns, if any.
    #[must_use]
    pub fn process(&self) -> Option<ProcessId> {
        match self {
            Self::ProcessStarted { process, .. }
            | Self::ProcessYielded { process, .. }
            | Self::ProcessStopped { process }
            | Self::ProcessFinished { process, .. }
            | Self::ProcessError { process, .. }
            | Self::Broadcast { process, .. }
            | Self::ContinuationInvoked { process } => Some(*process),
            Self::Forked { child, .. } => Some(*child),
            _ => None,
        }
    }
}

// =============================================================================
// Trace Record
// =============================================================================

/// A timestamped trace record.
#[derive(Clone, Debug)]
pub struct TraceRecord {
    /// Unique record ID within the session.
    pub id: u64,
    /// The tick when this event occurred.
    pub tick: u64,
    /// Timestamp in nanoseconds since the tracer was created.
    pub timestamp_ns: u64,
    /// The trace event.
    pub event: TraceEvent,
}

impl TraceRecord {
    /// Creates a new trace record.
    #[must_use]
    pub fn new(id: u64, tick: u64, timestamp_ns: u64, event: TraceEvent) -> Self {
        Self {
            id,
            tick,
            timestamp_ns,
            event,
        }
    }

    /// Returns the event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}
